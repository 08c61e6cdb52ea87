use domain::gateway::openai::OpenAiClient;
use domain::gateway::stream_video::StreamVideoClient;
use domain::gateway::Unconfigured;
use domain::transcript_job::{self, JobRunner, JobSettings, TranscriptJobQueue};
use events::EventPublisher;
use log::*;
use meeting_ai::traits::{call_platform, realtime, summarizer};
use secrecy::SecretString;
use service::{config::Config, logging::Logger};
use sse::SseDomainEventHandler;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let config = Config::new();
    Logger::init_logger(&config as &Config);

    info!("Starting meetings platform [{}]", config.runtime_env());

    let db = match service::init_database(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("Failed to establish database connection: {e}");
            std::process::exit(1);
        }
    };

    let call_platform = call_platform_provider(&config);
    let (summarizer, realtime) = openai_providers(&config);

    let sse_manager = Arc::new(sse::Manager::new());
    // The job worker only needs to notify clients; it never enqueues further jobs
    let sse_publisher = EventPublisher::new()
        .with_handler(Arc::new(SseDomainEventHandler::new(Arc::clone(&sse_manager))));

    let (job_queue, job_receiver) = TranscriptJobQueue::channel();
    let event_publisher = sse_publisher.clone().with_handler(Arc::new(job_queue));

    let runner = Arc::new(JobRunner::new(
        Arc::clone(&db),
        sse_publisher,
        Arc::clone(&call_platform),
        summarizer,
        JobSettings::from_config(&config),
    ));
    let worker = transcript_job::spawn_worker(job_receiver, runner);

    let app_state = web::AppState::new(config, &db)
        .with_sse_manager(sse_manager)
        .with_event_publisher(event_publisher)
        .with_call_platform(call_platform)
        .with_realtime(realtime);

    if let Err(e) = web::init_server(app_state).await {
        error!("Server stopped: {e}");
        worker.abort();
        std::process::exit(1);
    }
}

fn call_platform_provider(config: &Config) -> Arc<dyn call_platform::Provider> {
    let (Some(api_key), Some(api_secret)) = (config.stream_api_key(), config.stream_api_secret())
    else {
        warn!("Call-platform credentials are not configured; calls and stream tokens are unavailable");
        return Arc::new(Unconfigured);
    };

    match StreamVideoClient::new(
        &api_key,
        SecretString::new(api_secret),
        config.stream_base_url(),
    ) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            error!("Failed to build the call-platform client: {e}");
            Arc::new(Unconfigured)
        }
    }
}

fn openai_providers(
    config: &Config,
) -> (Arc<dyn summarizer::Provider>, Arc<dyn realtime::Provider>) {
    let Some(api_key) = config.openai_api_key() else {
        warn!("OpenAI is not configured; summaries and voice sessions are unavailable");
        return (Arc::new(Unconfigured), Arc::new(Unconfigured));
    };

    match OpenAiClient::new(SecretString::new(api_key), config.openai_base_url()) {
        Ok(client) => {
            let client = Arc::new(client);
            let summarizer: Arc<dyn summarizer::Provider> = client.clone();
            (summarizer, client)
        }
        Err(e) => {
            error!("Failed to build the OpenAI client: {e}");
            (Arc::new(Unconfigured), Arc::new(Unconfigured))
        }
    }
}
