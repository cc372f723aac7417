mod adjustment;
mod backoff;
mod circuit_breaker;
mod pool_config;
