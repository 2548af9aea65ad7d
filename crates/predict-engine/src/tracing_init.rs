//! Opt-in logging setup. The engine never installs a global subscriber on
//! its own — embedding applications own that decision — this is only for
//! binaries and examples that want a sane default.

/// Install an env-filtered `fmt` subscriber. Call at most once, from a
/// binary's `main`, never from library code.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
