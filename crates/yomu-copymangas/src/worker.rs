use std::{sync::Arc, thread};

use flume::{Receiver, Sender};

use crate::{auth::AuthManager, catalog::Catalog, error::Error};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Task {
    RefreshToken,
    FetchGenres,
}

/// Single background thread for work the host should not wait on.
///
/// The thread exits once the handle is dropped.
pub struct Worker(Sender<Task>);

impl Worker {
    pub fn spawn(auth: Arc<AuthManager>, catalog: Arc<Catalog>) -> Result<Self, Error> {
        let (tx, rx) = flume::unbounded();
        thread::Builder::new()
            .name("copymangas-worker".to_string())
            .spawn(move || run(rx, auth, catalog))?;
        Ok(Self(tx))
    }

    /// Queues `task`; `false` when the thread is gone.
    pub fn submit(&self, task: Task) -> bool {
        if let Err(e) = self.0.send(task) {
            error!("worker stopped, dropping {:?}", e.into_inner());
            return false;
        }
        true
    }
}

fn run(rx: Receiver<Task>, auth: Arc<AuthManager>, catalog: Arc<Catalog>) {
    while let Ok(task) = rx.recv() {
        debug!("running {:?}", task);
        match task {
            Task::RefreshToken => auth.run_refresh(),
            Task::FetchGenres => catalog.run_genre_fetch(),
        }
    }
    debug!("worker stopped");
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        auth::{RefreshRequest, TokenState, test::auth_server},
        config::{SettingsHandle, keys},
        testing::store,
        transport::Transport,
    };
    use serde_json::json;
    use std::time::{Duration, Instant};

    #[test]
    fn test_refresh_runs_in_background() {
        let settings = Arc::new(SettingsHandle::load(store(vec![
            (keys::USERNAME, json!("alice")),
            (keys::PASSWORD, json!("hunter2")),
        ])));
        let transport = Arc::new(Transport::new(Arc::new(auth_server()), settings.clone()));
        let auth = Arc::new(AuthManager::new(transport.clone()));
        let catalog = Arc::new(Catalog::new(transport));
        let worker = Worker::spawn(auth.clone(), catalog).unwrap();

        assert_eq!(auth.begin_refresh(), RefreshRequest::Started);
        assert!(worker.submit(Task::RefreshToken));

        let deadline = Instant::now() + Duration::from_secs(5);
        while auth.state() == TokenState::InProgress && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(auth.state(), TokenState::Succeeded);
        assert_eq!(settings.snapshot().token, "tok-alice");
    }
}
