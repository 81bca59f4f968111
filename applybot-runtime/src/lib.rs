//! Runtime for the applybot binary.
//!
//! The pipeline drives one browser session strictly in sequence, so the
//! runtime is single threaded. Cancellation is coarse: a shared stop token
//! that the crawl checks between pairs and pages.
use anyhow::Result;
use tokio::runtime::{Builder, Runtime};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct ApplyRuntime {
    runtime: Runtime,
    stop: CancellationToken,
}

impl ApplyRuntime {
    /// Build a current-thread Tokio runtime with IO and timers enabled.
    ///
    /// ```
    /// use applybot_runtime::ApplyRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ApplyRuntime::build("doctest-runtime").expect("runtime builds");
    /// let value = runtime.block_on(async { 2 + 2 });
    /// assert_eq!(value, 4);
    /// runtime.shutdown(Duration::from_millis(10));
    /// ```
    pub fn build(thread_name: &str) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .thread_name(thread_name)
            .build()?;
        Ok(Self {
            runtime,
            stop: CancellationToken::new(),
        })
    }

    /// Token cancelled on Ctrl-C or shutdown.
    pub fn stop_token(&self) -> CancellationToken {
        self.stop.clone()
    }

    /// Run a future to completion on the runtime.
    ///
    /// ```
    /// use applybot_runtime::ApplyRuntime;
    ///
    /// let runtime = ApplyRuntime::build("block-on-example").unwrap();
    /// assert_eq!(runtime.block_on(async { "done" }), "done");
    /// ```
    pub fn block_on<F: std::future::Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Cancel the stop token on the first Ctrl-C. The in-flight application
    /// finishes; the crawl stops at the next page or pair boundary.
    pub fn stop_on_ctrl_c(&self) -> JoinHandle<()> {
        let stop = self.stop.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                _ = stop.cancelled() => {}
                res = tokio::signal::ctrl_c() => match res {
                    Ok(()) => {
                        tracing::warn!("stop requested; finishing the current application");
                        stop.cancel();
                    }
                    Err(err) => tracing::warn!(error = %err, "cannot listen for Ctrl-C"),
                },
            }
        })
    }

    /// Cancel outstanding work and shut the runtime down.
    ///
    /// ```
    /// use applybot_runtime::ApplyRuntime;
    /// use std::time::Duration;
    ///
    /// let runtime = ApplyRuntime::build("shutdown-example").unwrap();
    /// let stop = runtime.stop_token();
    /// runtime.shutdown(Duration::from_millis(5));
    /// assert!(stop.is_cancelled());
    /// ```
    pub fn shutdown(self, graceful: std::time::Duration) {
        self.stop.cancel();
        self.runtime.shutdown_timeout(graceful);
    }
}
