pub mod filters;
pub mod poller;
pub mod process;
pub mod provider;
pub mod ranker;
pub mod sampler;
pub mod snapshot;
pub mod sysinfo_provider;
pub mod utils;

#[cfg(test)]
pub(crate) mod fake;

pub use self::poller::Poller;
pub use self::process::ProcessSample;
pub use self::provider::{MetricsProvider, ProviderError, ProviderResult};
pub use self::ranker::{rank_all, top_n, RankMetric, Rankings, DEFAULT_TOP_N};
pub use self::sampler::{Sampler, SamplerSettings};
pub use self::snapshot::SystemSnapshot;
pub use self::sysinfo_provider::SysinfoProvider;
