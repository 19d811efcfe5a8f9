use anyhow::{Result, anyhow, bail};
use chrono::{DateTime, Utc};
use gamewatch_types::{HistoryPoint, PlayerSession, ServerId, StatusSnapshot};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

use super::PollStore;

#[derive(Default)]
struct State {
    statuses: BTreeMap<ServerId, StatusSnapshot>,
    history: Vec<HistoryPoint>,
    sessions: Vec<PlayerSession>,
}

/// In-process `PollStore` for embedding and tests.
///
/// Enforces the same invariants as the SQLite store: one status per server
/// and at most one open session per (server, player).
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    fail_writes: AtomicBool,
    failing_player: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every write fail until switched back, to exercise error paths.
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make session writes for one player name fail, to exercise partial failures.
    pub fn set_failing_player(&self, player: Option<&str>) {
        if let Ok(mut failing) = self.failing_player.lock() {
            *failing = player.map(str::to_string);
        }
    }

    fn session_writable(&self, player: &str) -> Result<MutexGuard<'_, State>> {
        let failing = self
            .failing_player
            .lock()
            .map_err(|_| anyhow!("memory store mutex poisoned"))?
            .as_deref()
            == Some(player);
        if failing {
            bail!("memory store is failing writes for {}", player);
        }
        self.writable()
    }

    fn state(&self) -> Result<MutexGuard<'_, State>> {
        self.state.lock().map_err(|_| anyhow!("memory store mutex poisoned"))
    }

    fn writable(&self) -> Result<MutexGuard<'_, State>> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("memory store is failing writes");
        }
        self.state()
    }

    pub fn status(&self, server_id: ServerId) -> Option<StatusSnapshot> {
        self.state().ok()?.statuses.get(&server_id).cloned()
    }

    pub fn history(&self) -> Vec<HistoryPoint> {
        self.state().map(|s| s.history.clone()).unwrap_or_default()
    }

    pub fn sessions(&self) -> Vec<PlayerSession> {
        self.state().map(|s| s.sessions.clone()).unwrap_or_default()
    }

    /// Names with an open session on `server_id`, sorted.
    pub fn open_players(&self, server_id: ServerId) -> Vec<String> {
        let mut names: Vec<String> = self
            .sessions()
            .into_iter()
            .filter(|s| s.server_id == server_id && s.is_open())
            .map(|s| s.player_name)
            .collect();
        names.sort();
        names
    }

    /// Seed a session directly, bypassing the open-session check.
    pub fn insert_session(&self, session: PlayerSession) {
        if let Ok(mut state) = self.state() {
            state.sessions.push(session);
        }
    }
}

impl PollStore for MemoryStore {
    fn upsert_status(&self, snapshot: &StatusSnapshot) -> Result<()> {
        self.writable()?
            .statuses
            .insert(snapshot.server_id, snapshot.clone());
        Ok(())
    }

    fn statuses(&self) -> Result<Vec<StatusSnapshot>> {
        Ok(self.state()?.statuses.values().cloned().collect())
    }

    fn insert_history(&self, points: &[HistoryPoint]) -> Result<usize> {
        self.writable()?.history.extend_from_slice(points);
        Ok(points.len())
    }

    fn open_session(&self, server_id: ServerId, player: &str, at: DateTime<Utc>) -> Result<bool> {
        let mut state = self.session_writable(player)?;
        let already_open = state
            .sessions
            .iter()
            .any(|s| s.server_id == server_id && s.player_name == player && s.is_open());
        if already_open {
            return Ok(false);
        }
        state.sessions.push(PlayerSession::open(server_id, player, at));
        Ok(true)
    }

    fn close_session(
        &self,
        server_id: ServerId,
        player: &str,
        at: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let mut state = self.session_writable(player)?;
        let open = state
            .sessions
            .iter_mut()
            .find(|s| s.server_id == server_id && s.player_name == player && s.is_open());
        Ok(open.map(|session| {
            session.close(at);
            session.duration_secs
        }))
    }

    fn close_server_sessions(&self, server_id: ServerId, at: DateTime<Utc>) -> Result<usize> {
        let mut state = self.writable()?;
        let mut closed = 0;
        for session in state
            .sessions
            .iter_mut()
            .filter(|s| s.server_id == server_id && s.is_open())
        {
            session.close(at);
            closed += 1;
        }
        Ok(closed)
    }

    fn close_orphan_sessions(&self, at: DateTime<Utc>) -> Result<usize> {
        let mut state = self.writable()?;
        let mut closed = 0;
        for session in state.sessions.iter_mut().filter(|s| s.is_open()) {
            session.close(at);
            closed += 1;
        }
        Ok(closed)
    }
}
