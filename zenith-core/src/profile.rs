/// Turn on puffin scopes, optionally serving them to `puffin_viewer`.
///
/// The returned server must be kept alive for as long as profiling data should be streamed.
pub fn initialize(serve: bool) -> Result<Option<puffin_http::Server>, anyhow::Error> {
    profiling::puffin::set_scopes_on(true);

    if !serve {
        return Ok(None);
    }

    let server_addr = format!("127.0.0.1:{}", puffin_http::DEFAULT_PORT);
    let server = puffin_http::Server::new(&server_addr)?;
    log::info!("Serving puffin profiler on {server_addr}");

    Ok(Some(server))
}

/// Close the current profiler frame.
#[inline]
pub fn new_frame() {
    profiling::finish_frame!();
}
