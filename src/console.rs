//! Line-based control console: `start`, `stop` and `exit` bind and release the
//! HTTP listener without restarting the process.
use crate::app::{self, AppState};
use anyhow::Result;
use std::future::Future;
use std::io::BufRead;
use std::net::SocketAddr;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const USAGE: &str = r#"Type "start" to run server, "stop" to stop it, or "exit" to quit:"#;
const UNKNOWN: &str = r#"Unknown command. Use "start", "stop", or "exit"."#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Stop,
    Exit,
    Unknown,
}

impl Command {
    pub fn parse(line: &str) -> Self {
        match line.trim().to_lowercase().as_str() {
            "start" => Command::Start,
            "stop" => Command::Stop,
            "exit" => Command::Exit,
            _ => Command::Unknown,
        }
    }
}

struct RunningServer {
    shutdown: oneshot::Sender<()>,
    handle: JoinHandle<Result<()>>,
}

pub struct Console {
    addr: SocketAddr,
    state: AppState,
    running: Option<RunningServer>,
}

impl Console {
    pub fn new(addr: SocketAddr, state: AppState) -> Self {
        Self {
            addr,
            state,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Starts the server, then follows stdin until `exit` or a shutdown signal.
    /// Closing stdin leaves the server up until a signal arrives.
    pub async fn run(self) -> Result<()> {
        self.run_with(stdin_lines(), app::shutdown_signal()).await
    }

    pub async fn run_with<F>(mut self, mut input: mpsc::Receiver<String>, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        self.start().await;
        println!("{}", USAGE);

        tokio::pin!(shutdown);
        let mut input_open = true;

        loop {
            tokio::select! {
                _ = &mut shutdown => break,
                line = input.recv(), if input_open => match line {
                    Some(line) => {
                        if !self.execute(Command::parse(&line)).await {
                            break;
                        }
                    }
                    None => {
                        info!("Console input closed; serving until shutdown signal");
                        input_open = false;
                    }
                },
            }
        }

        self.stop().await;
        Ok(())
    }

    /// Runs one command. Returns false once the console should quit.
    pub async fn execute(&mut self, command: Command) -> bool {
        match command {
            Command::Start => self.start().await,
            Command::Stop => self.stop().await,
            Command::Exit => return false,
            Command::Unknown => println!("{}", UNKNOWN),
        }
        true
    }

    async fn start(&mut self) {
        if self.is_running() {
            println!("Server is already running.");
            return;
        }
        let listener = match app::bind(self.addr).await {
            Ok(l) => l,
            Err(e) => {
                error!("Failed to start server: {:#}", e);
                return;
            }
        };
        let (tx, rx) = oneshot::channel::<()>();
        let shutdown = async move {
            let _ = rx.await;
        };
        let handle = tokio::spawn(app::serve(listener, self.state.clone(), shutdown));
        info!("Server started on port {}", self.addr.port());
        self.running = Some(RunningServer {
            shutdown: tx,
            handle,
        });
    }

    async fn stop(&mut self) {
        let Some(server) = self.running.take() else {
            println!("Server is not running.");
            return;
        };
        let _ = server.shutdown.send(());
        match server.handle.await {
            Ok(Ok(())) => info!("Server stopped."),
            Ok(Err(e)) => warn!("Server stopped with error: {:#}", e),
            Err(e) => error!("Server task failed: {}", e),
        }
    }
}

/// Blocking stdin reads live on their own thread: a read left pending there
/// cannot keep the runtime alive after shutdown.
fn stdin_lines() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::JsonFileStore;
    use std::sync::Arc;
    use std::time::Duration;

    #[test]
    fn parses_commands_case_insensitively() {
        assert_eq!(Command::parse("start"), Command::Start);
        assert_eq!(Command::parse("  STOP \n"), Command::Stop);
        assert_eq!(Command::parse("Exit"), Command::Exit);
        assert_eq!(Command::parse("restart"), Command::Unknown);
        assert_eq!(Command::parse(""), Command::Unknown);
    }

    async fn seeded_state(dir: &tempfile::TempDir) -> AppState {
        let store = JsonFileStore::new(dir.path().join("media.json"));
        store.ensure_seeded().await.expect("seed");
        AppState::new(Arc::new(store), dir.path().join("docs.html"))
    }

    fn local_console(state: AppState) -> Console {
        Console::new(SocketAddr::from(([127, 0, 0, 1], 0)), state)
    }

    #[tokio::test]
    async fn start_and_stop_toggle_listener() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut console = local_console(seeded_state(&dir).await);

        assert!(console.execute(Command::Start).await);
        assert!(console.is_running());
        assert!(console.execute(Command::Start).await);
        assert!(console.is_running());

        assert!(console.execute(Command::Stop).await);
        assert!(!console.is_running());
        assert!(console.execute(Command::Stop).await);

        assert!(!console.execute(Command::Exit).await);
    }

    #[tokio::test]
    async fn signal_ends_run_while_input_is_idle() {
        let dir = tempfile::tempdir().expect("tempdir");
        let console = local_console(seeded_state(&dir).await);

        // Sender stays alive and silent, like a terminal nobody types into.
        let (_input_tx, input_rx) = mpsc::channel::<String>(1);
        let (signal_tx, signal_rx) = oneshot::channel::<()>();
        signal_tx.send(()).expect("receiver alive");
        let signal = async move {
            let _ = signal_rx.await;
        };

        tokio::time::timeout(Duration::from_secs(5), console.run_with(input_rx, signal))
            .await
            .expect("console returns after shutdown signal")
            .expect("clean shutdown");
    }

    #[tokio::test]
    async fn exit_command_ends_run() {
        let dir = tempfile::tempdir().expect("tempdir");
        let console = local_console(seeded_state(&dir).await);

        let (input_tx, input_rx) = mpsc::channel::<String>(4);
        input_tx.send("stop".to_string()).await.expect("queued");
        input_tx.send("EXIT".to_string()).await.expect("queued");

        tokio::time::timeout(
            Duration::from_secs(5),
            console.run_with(input_rx, std::future::pending::<()>()),
        )
        .await
        .expect("console returns after exit")
        .expect("clean exit");
    }

    #[tokio::test]
    async fn closed_input_keeps_serving_until_signal() {
        let dir = tempfile::tempdir().expect("tempdir");
        let console = local_console(seeded_state(&dir).await);

        let (input_tx, input_rx) = mpsc::channel::<String>(1);
        drop(input_tx);
        let signal = tokio::time::sleep(Duration::from_millis(50));

        tokio::time::timeout(Duration::from_secs(5), console.run_with(input_rx, signal))
            .await
            .expect("console returns after shutdown signal")
            .expect("clean shutdown");
    }
}
