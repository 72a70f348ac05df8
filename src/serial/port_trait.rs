//! Trait abstraction for serial port operations to enable testing

use async_trait::async_trait;
use std::io;

use crate::error::Result;

/// Line-oriented reading from the controller link
#[async_trait]
pub trait LineTransport: Send {
    /// Read the next newline-terminated line, without the terminator.
    ///
    /// Returns `Ok(None)` once the stream has ended.
    async fn read_line(&mut self) -> io::Result<Option<String>>;

    /// Discard anything buffered but not yet read
    async fn clear_input(&mut self) -> io::Result<()>;

    /// Human-readable endpoint, for logs
    fn description(&self) -> &str;
}

/// Opens transports; retried by the session until it succeeds
#[async_trait]
pub trait Connector: Send {
    async fn connect(&mut self, port: &str, baud_rate: u32) -> Result<Box<dyn LineTransport>>;
}

#[cfg(test)]
pub mod mocks {
    use super::*;
    use crate::error::BridgeError;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    /// Transport that replays scripted reads; clones share the script.
    ///
    /// Once the script runs dry it yields an empty line every few
    /// milliseconds, like an idle link with a short read timeout.
    #[derive(Clone, Default)]
    pub struct ScriptedTransport {
        pub script: Arc<Mutex<VecDeque<io::Result<Option<String>>>>>,
        pub clears: Arc<AtomicUsize>,
    }

    impl ScriptedTransport {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn push_line(&self, line: &str) {
            self.script.lock().unwrap().push_back(Ok(Some(line.to_string())));
        }

        pub fn push_error(&self, kind: io::ErrorKind) {
            self.script
                .lock()
                .unwrap()
                .push_back(Err(io::Error::new(kind, "Mock read error")));
        }

        pub fn push_eof(&self) {
            self.script.lock().unwrap().push_back(Ok(None));
        }

        pub fn remaining(&self) -> usize {
            self.script.lock().unwrap().len()
        }

        pub fn clear_count(&self) -> usize {
            self.clears.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl LineTransport for ScriptedTransport {
        async fn read_line(&mut self) -> io::Result<Option<String>> {
            let next = self.script.lock().unwrap().pop_front();
            match next {
                Some(item) => item,
                None => {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    Ok(Some(String::new()))
                }
            }
        }

        async fn clear_input(&mut self) -> io::Result<()> {
            self.clears.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn description(&self) -> &str {
            "scripted"
        }
    }

    /// Connector that fails a set number of times before handing out
    /// clones of one [`ScriptedTransport`].
    #[derive(Clone, Default)]
    pub struct MockConnector {
        pub transport: ScriptedTransport,
        pub failures_remaining: Arc<AtomicUsize>,
        pub attempts: Arc<AtomicUsize>,
    }

    impl MockConnector {
        pub fn new(transport: ScriptedTransport) -> Self {
            Self {
                transport,
                ..Self::default()
            }
        }

        pub fn failing(transport: ScriptedTransport, failures: usize) -> Self {
            let connector = Self::new(transport);
            connector.failures_remaining.store(failures, Ordering::SeqCst);
            connector
        }

        pub fn attempts(&self) -> usize {
            self.attempts.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Connector for MockConnector {
        async fn connect(&mut self, port: &str, _baud_rate: u32) -> Result<Box<dyn LineTransport>> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            let failed = self
                .failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if failed {
                return Err(BridgeError::Connection(format!("Mock failure opening {}", port)));
            }
            Ok(Box::new(self.transport.clone()))
        }
    }
}
