mod api_client;
pub mod http_audio_url_resolver;
pub mod http_job_service;
pub mod persistence_worker;
#[cfg(test)]
mod test_server;
