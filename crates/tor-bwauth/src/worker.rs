//! Reading bandwidth and guardfraction files off the calling thread.
//!
//! Reading a large file can take a while.  The functions here load and
//! parse a file on a separate thread, and hand back a [`PendingRead`]
//! that resolves once the file is parsed.  Applying the result to a vote
//! or a cache is left to the caller, on its own thread.

use crate::bwfile::BwFile;
use crate::guardfraction::GuardFractionFile;
use crate::loader::FileLoader;
use crate::{Error, Result};

use futures::channel::oneshot;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::debug;

/// A read in progress on a background thread.
#[must_use = "a PendingRead does nothing unless you wait for it"]
pub struct PendingRead<T> {
    /// Where the background thread will send its answer.
    rx: oneshot::Receiver<Result<T>>,
}

impl<T> PendingRead<T> {
    /// Wait for the background read to finish, and return its result.
    pub async fn wait(self) -> Result<T> {
        match self.rx.await {
            Ok(r) => r,
            Err(oneshot::Canceled) => Err(Error::WorkerGone),
        }
    }
}

/// Run `func` on a new thread named `name`, and return a [`PendingRead`]
/// for its result.
pub fn run_in_background<T, F>(name: &str, func: F) -> Result<PendingRead<T>>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::Builder::new()
        .name(name.to_string())
        .spawn(move || {
            // If the receiver is gone, nobody wants the answer.
            let _ = tx.send(func());
        })
        .map_err(|e| Error::Io(format!("thread {}", name), Arc::new(e)))?;
    Ok(PendingRead { rx })
}

/// Load and parse the bandwidth file at `path` on a background thread.
pub fn read_bwfile_in_background<L>(
    loader: Arc<L>,
    path: PathBuf,
    now: SystemTime,
) -> Result<PendingRead<BwFile>>
where
    L: FileLoader + Send + Sync + ?Sized + 'static,
{
    run_in_background("bwfile reader", move || {
        debug!("Reading bandwidth file {}", path.display());
        let text = loader.load(&path)?;
        BwFile::parse(&text, now)
    })
}

/// Load and parse the guardfraction file at `path` on a background thread.
pub fn read_guardfraction_in_background<L>(
    loader: Arc<L>,
    path: PathBuf,
    now: SystemTime,
) -> Result<PendingRead<GuardFractionFile>>
where
    L: FileLoader + Send + Sync + ?Sized + 'static,
{
    run_in_background("guardfraction reader", move || {
        debug!("Reading guardfraction file {}", path.display());
        let text = loader.load(&path)?;
        GuardFractionFile::parse(&text, now)
    })
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::bwcache::MeasuredBwCache;
    use futures::executor::block_on;
    use std::path::Path;
    use tor_dircommon::time::from_unix_secs;

    struct Canned(&'static str);
    impl FileLoader for Canned {
        fn load(&self, _path: &Path) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn background_bwfile() -> Result<()> {
        let loader = Arc::new(Canned(
            "1000\n=====\nbw=5 node_id=$0101010101010101010101010101010101010101\n",
        ));
        let now = from_unix_secs(1100).unwrap();
        let pending = read_bwfile_in_background(loader, "bw".into(), now)?;
        let bwfile = block_on(pending.wait())?;
        assert_eq!(bwfile.lines().len(), 1);

        let mut cache = MeasuredBwCache::new();
        let summary = bwfile.apply(None, &mut cache, now);
        assert_eq!(summary.n_cached, 1);
        assert_eq!(cache.len(), 1);
        Ok(())
    }

    #[test]
    fn background_failure() -> Result<()> {
        let pending = run_in_background::<(), _>("failing", || Err(Error::EmptyFile))?;
        assert!(matches!(block_on(pending.wait()), Err(Error::EmptyFile)));

        let pending = run_in_background::<(), _>("panicking", || panic!("oops"))?;
        assert!(matches!(block_on(pending.wait()), Err(Error::WorkerGone)));
        Ok(())
    }
}
