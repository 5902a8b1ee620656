use ::log::info;
use ::std::sync::Arc;

use ::syndicate_server::config::Config;
use ::syndicate_server::crypto::CredentialCipher;
use ::syndicate_server::registry::SiteRegistry;
use ::syndicate_server::State;

#[::tokio::main]
async fn main() -> Result<(), Box<dyn ::std::error::Error>> {
    ::env_logger::init();

    let config = Config::from_env()?;

    let (options, content) =
        ::syndicate_server::stores::make_providers(&config).await?;

    let cipher = CredentialCipher::new(&config.credential_key);
    let registry = SiteRegistry::new(options, cipher);

    // First start issues the inbound credential; later starts keep it.
    let credential = registry.ensure_own_credential().await?;
    info!("inbound credential ready ({} chars)", credential.len());

    let socket = ::std::net::UdpSocket::bind("0.0.0.0:0")?;
    let sink = ::cadence::UdpMetricSink::from(
        (config.statsd_address.as_str(), config.statsd_port),
        socket,
    )?;
    let statsd_client = ::cadence::StatsdClient::from_sink("syndicate", sink);

    let client = Arc::new(::syndicate_server::client::HttpWireClient::new()?);

    let state = Arc::new(State {
        site_url: config.site_url.clone(),
        admin_token: config.admin_token.clone(),
        registry,
        content,
        client,
        statsd_client,
        dispatch_locks: Default::default(),
    });

    let routes = ::syndicate_server::routes(state);

    info!("listening on {}", config.http_port);
    ::warp::serve(routes)
        .run(([0, 0, 0, 0], config.http_port))
        .await;

    Ok(())
}
