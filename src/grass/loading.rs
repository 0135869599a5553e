// src/grass/loading.rs
//! All-or-nothing mesh loading.
//!
//! Two front ends share the same contract: either every load resolves and the
//! handles come back in request order, or the first failure aborts the whole
//! batch and names the asset that failed.

use std::future::Future;
use std::pin::Pin;
use std::task::Poll;

use futures_lite::future;

use super::error::MeshLoadError;
use super::lod::MeshHandle;

/// Resolves asset paths into renderer mesh handles.
pub trait MeshLoader {
    type Handle: MeshHandle;

    fn load_mesh(&self, path: &str) -> impl Future<Output = Result<Self::Handle, MeshLoadError>>;
}

/// Drive every future to completion; fail as soon as any one fails.
///
/// Results keep the input order. Futures still pending when a failure arrives
/// are dropped.
pub async fn try_join_all<F, T, E>(futures: impl IntoIterator<Item = F>) -> Result<Vec<T>, E>
where
    F: Future<Output = Result<T, E>>,
{
    let mut pending: Vec<Pin<Box<F>>> = futures.into_iter().map(Box::pin).collect();
    let mut done: Vec<Option<T>> = pending.iter().map(|_| None).collect();

    future::poll_fn(|cx| {
        let mut all_ready = true;
        for (slot, fut) in done.iter_mut().zip(pending.iter_mut()) {
            if slot.is_some() {
                continue;
            }
            match fut.as_mut().poll(cx) {
                Poll::Ready(Ok(v)) => *slot = Some(v),
                Poll::Ready(Err(e)) => return Poll::Ready(Err(e)),
                Poll::Pending => all_ready = false,
            }
        }
        if all_ready {
            Poll::Ready(Ok(done.iter_mut().filter_map(Option::take).collect()))
        } else {
            Poll::Pending
        }
    })
    .await
}

/// Load every path with `loader`, all-or-nothing.
pub async fn load_all<L: MeshLoader>(
    loader: &L,
    paths: &[String],
) -> Result<Vec<L::Handle>, MeshLoadError> {
    try_join_all(paths.iter().map(|p| loader.load_mesh(p))).await
}

/// Observed state of one load in a polled (non-async) loader.
#[derive(Clone, Debug, PartialEq)]
pub enum LoadSlot<H> {
    Pending,
    Ready(H),
    Failed(String),
}

/// Settle a polled batch: `Ok(None)` while anything is still pending,
/// `Ok(Some(handles))` once all are ready, `Err` on the first failure.
pub fn settle_loads<H>(
    slots: impl IntoIterator<Item = (String, LoadSlot<H>)>,
) -> Result<Option<Vec<H>>, MeshLoadError> {
    let mut ready = Vec::new();
    let mut pending = false;
    for (path, slot) in slots {
        match slot {
            LoadSlot::Ready(h) => ready.push(h),
            LoadSlot::Pending => pending = true,
            LoadSlot::Failed(reason) => return Err(MeshLoadError::new(path, reason)),
        }
    }
    Ok(if pending { None } else { Some(ready) })
}
