use uarchsim_core::config::{Config, PenaltyModel, PredictorMode, PrefetcherMode};

/// Reference machine with the given predictor and prefetcher.
pub fn config(predictor: PredictorMode, prefetcher: PrefetcherMode) -> Config {
    let mut config = Config::default();
    config.branch.predictor = predictor;
    config.prefetch.algorithm = prefetcher;
    config
}

/// Reference machine without prefetching, so cache timing is exact.
pub fn quiet_config() -> Config {
    config(PredictorMode::GSharePath, PrefetcherMode::None)
}

/// Same as [`quiet_config`] with fetch-stall branch penalties.
pub fn stall_config() -> Config {
    let mut config = quiet_config();
    config.branch.penalty_model = PenaltyModel::FetchStall;
    config
}
