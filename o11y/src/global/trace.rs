use crate::trace::{NoopTracer, SharedTracer};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

/// The currently installed global tracer.
static GLOBAL_TRACER: OnceLock<RwLock<SharedTracer>> = OnceLock::new();

#[inline]
fn global_tracer() -> &'static RwLock<SharedTracer> {
    GLOBAL_TRACER.get_or_init(|| RwLock::new(Arc::new(NoopTracer::new())))
}

/// Returns the global tracer.
///
/// A [`NoopTracer`] is returned until [`set_tracer`] is called.
pub fn tracer() -> SharedTracer {
    global_tracer()
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .clone()
}

/// Installs `new_tracer` as the global tracer, returning the previous one.
pub fn set_tracer(new_tracer: SharedTracer) -> SharedTracer {
    let mut tracer = global_tracer()
        .write()
        .unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *tracer, new_tracer)
}
