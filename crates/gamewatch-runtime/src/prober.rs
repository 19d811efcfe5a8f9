use futures::future::BoxFuture;
use gamewatch_protocols::{ProbeReport, QueryClient};
use gamewatch_types::Server;
use std::time::Duration;

/// Network access used by the worker pool.
///
/// The protocol is chosen from `server.game`; unknown game types fall back to
/// the Source query.
pub trait Prober: Send + Sync {
    fn status<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, gamewatch_protocols::Result<ProbeReport>>;

    fn roster<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, gamewatch_protocols::Result<Vec<String>>>;
}

/// Prober that speaks the real wire protocols.
#[derive(Debug, Clone, Copy, Default)]
pub struct NetworkProber {
    client: QueryClient,
}

impl NetworkProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: QueryClient::new(timeout),
        }
    }
}

impl Prober for NetworkProber {
    fn status<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, gamewatch_protocols::Result<ProbeReport>> {
        Box::pin(
            self.client
                .probe(server.game.protocol(), &server.host, server.port),
        )
    }

    fn roster<'a>(&'a self, server: &'a Server) -> BoxFuture<'a, gamewatch_protocols::Result<Vec<String>>> {
        Box::pin(
            self.client
                .probe_players(server.game.protocol(), &server.host, server.port),
        )
    }
}

#[cfg(test)]
pub(crate) mod scripted {
    use super::*;
    use gamewatch_types::ServerId;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Prober answering from a table; servers without an entry time out.
    #[derive(Default)]
    pub struct ScriptedProber {
        answers: Mutex<HashMap<ServerId, (ProbeReport, Option<Vec<String>>)>>,
    }

    impl ScriptedProber {
        pub fn set(&self, id: ServerId, report: ProbeReport, roster: Option<Vec<&str>>) {
            let roster = roster.map(|names| names.into_iter().map(str::to_string).collect());
            self.answers.lock().unwrap().insert(id, (report, roster));
        }

        pub fn fail(&self, id: ServerId) {
            self.answers.lock().unwrap().remove(&id);
        }

        fn answer(&self, id: ServerId) -> Option<(ProbeReport, Option<Vec<String>>)> {
            self.answers.lock().unwrap().get(&id).cloned()
        }
    }

    impl Prober for ScriptedProber {
        fn status<'a>(
            &'a self,
            server: &'a Server,
        ) -> BoxFuture<'a, gamewatch_protocols::Result<ProbeReport>> {
            let answer = self.answer(server.id);
            Box::pin(async move {
                answer
                    .map(|(report, _)| report)
                    .ok_or(gamewatch_protocols::Error::Timeout)
            })
        }

        fn roster<'a>(
            &'a self,
            server: &'a Server,
        ) -> BoxFuture<'a, gamewatch_protocols::Result<Vec<String>>> {
            let answer = self.answer(server.id);
            Box::pin(async move {
                answer
                    .and_then(|(_, roster)| roster)
                    .ok_or(gamewatch_protocols::Error::Timeout)
            })
        }
    }
}
