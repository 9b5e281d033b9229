//! The engine's TOML configuration: the three transport endpoints the
//! launcher binds sockets to, plus thread-naming/log-level knobs. There
//! is no keypair material here — authentication is an explicit Non-goal.

use ::serde::Deserialize;

fn default_thread_name_prefix() -> String {
    "njoy".into()
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Where the handshake REP socket binds, e.g. `tcp://0.0.0.0:7890`.
    pub requests: String,
    /// Where the Input Multiplexer's PULL ingress binds.
    pub input_events: String,
    /// Where the Output Multiplexer's ROUTER frontend binds.
    pub output_events: String,
    #[serde(default = "default_thread_name_prefix")]
    pub thread_name_prefix: String,
}
