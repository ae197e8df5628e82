use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

/// JSON 형식의 구조화된 로그 subscriber를 만듭니다.
/// RUST_LOG 환경 변수가 있으면 `default_filter`보다 우선합니다.
pub fn get_subscriber<Sink>(default_filter: &str, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let formatting_layer = tracing_subscriber::fmt::layer()
        .with_writer(sink)
        .json();

    Registry::default().with(env_filter).with(formatting_layer)
}

/// Install `subscriber` globally and route `log` records into it.
///
/// Fails if a global subscriber is already set.
pub fn init_subscriber(subscriber: impl Subscriber + Send + Sync + 'static) -> Result<(), TryInitError> {
    subscriber.try_init()
}

/// 서버 기본 설정: stdout, `info` 레벨
pub fn init_telemetry() -> Result<(), TryInitError> {
    init_subscriber(get_subscriber("info", std::io::stdout))
}
