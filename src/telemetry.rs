use tracing::Subscriber;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// 구조화된 로깅 subscriber를 생성합니다.
/// JSON 형식의 로그를 출력하며, RUST_LOG 환경 변수가 없으면 `default_filter`를 사용합니다.
pub fn get_subscriber(default_filter: &str) -> impl Subscriber + Send + Sync {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(formatting_layer)
}

/// 전역 subscriber로 등록합니다. 이미 등록되어 있으면 에러를 반환합니다.
pub fn init_telemetry(default_filter: &str) -> Result<(), TryInitError> {
    get_subscriber(default_filter).try_init()
}
