/// Sequential async step runner
///
/// Runs steps one after another, awaiting each. A step either lets the queue
/// advance (`ControlFlow::Continue`) or stops it (`ControlFlow::Break`).
/// Cancellation, timeouts and retries are the step function's business.

use std::future::Future;
use std::ops::ControlFlow;

/// Runs `step` over every present entry of `queue`, in order
///
/// `None` entries are skipped. Returns `Continue(())` only after every step
/// advanced, or the first `Break`.
///
/// # Examples
///
/// ```
/// use std::ops::ControlFlow;
/// use rhtmx_navigator::queue::run_queue;
///
/// # tokio_test_block(async {
/// let mut seen = Vec::new();
/// let flow = run_queue(vec![Some(1), None, Some(2), Some(3)], |n| {
///     seen.push(n);
///     async move {
///         if n == 2 { ControlFlow::Break("stopped at 2") } else { ControlFlow::Continue(()) }
///     }
/// })
/// .await;
/// assert_eq!(flow, ControlFlow::Break("stopped at 2"));
/// assert_eq!(seen, vec![1, 2]);
/// # });
/// # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub async fn run_queue<S, F, Fut, B>(queue: Vec<Option<S>>, mut step: F) -> ControlFlow<B>
where
    F: FnMut(S) -> Fut,
    Fut: Future<Output = ControlFlow<B>>,
{
    for item in queue.into_iter().flatten() {
        if let ControlFlow::Break(reason) = step(item).await {
            return ControlFlow::Break(reason);
        }
    }

    ControlFlow::Continue(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_empty_queue_completes() {
        let flow: ControlFlow<()> = run_queue(Vec::<Option<u8>>::new(), |_| async {
            ControlFlow::Continue(())
        })
        .await;
        assert_eq!(flow, ControlFlow::Continue(()));
    }

    #[tokio::test]
    async fn test_steps_run_in_order_after_awaits() {
        let order = Arc::new(Mutex::new(Vec::new()));
        let flow: ControlFlow<()> = run_queue(vec![Some(3u64), Some(1), Some(2)], |delay| {
            let order = order.clone();
            async move {
                tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
                order.lock().unwrap().push(delay);
                ControlFlow::Continue(())
            }
        })
        .await;

        assert_eq!(flow, ControlFlow::Continue(()));
        assert_eq!(*order.lock().unwrap(), vec![3, 1, 2]);
    }

    #[tokio::test]
    async fn test_break_stops_queue() {
        let ran = Arc::new(Mutex::new(Vec::new()));
        let flow = run_queue(vec![Some("a"), Some("b"), Some("c")], |label| {
            let ran = ran.clone();
            async move {
                ran.lock().unwrap().push(label);
                if label == "b" {
                    ControlFlow::Break(label)
                } else {
                    ControlFlow::Continue(())
                }
            }
        })
        .await;

        assert_eq!(flow, ControlFlow::Break("b"));
        assert_eq!(*ran.lock().unwrap(), vec!["a", "b"]);
    }
}
