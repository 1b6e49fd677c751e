use anyhow::{Context, Result};
use log::debug;
use std::sync::OnceLock;
use tokio::runtime::Runtime;

static GLOBAL_RUNTIME: OnceLock<Runtime> = OnceLock::new();

/// Process-wide runtime for callers that arrive without one (FFI).
///
/// Must not be called from inside an async context.
pub fn init_global_runtime_blocking() -> Result<&'static Runtime> {
    if let Some(runtime) = GLOBAL_RUNTIME.get() {
        return Ok(runtime);
    }
    let threads = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(2);
    let threads = std::cmp::max(threads, 2);
    debug!("Initializing global runtime with {} threads", threads);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(threads)
        .thread_name("fitkage-worker")
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;
    // A racing caller may have won; its runtime is kept and ours dropped.
    Ok(GLOBAL_RUNTIME.get_or_init(|| runtime))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_is_shared() {
        let a = init_global_runtime_blocking().unwrap() as *const Runtime;
        let b = init_global_runtime_blocking().unwrap() as *const Runtime;
        assert_eq!(a, b);
        let value = init_global_runtime_blocking()
            .unwrap()
            .block_on(async { 21 * 2 });
        assert_eq!(value, 42);
    }
}
