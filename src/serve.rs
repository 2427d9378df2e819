//! Development server for previewing the built site.
//!
//! A small `tiny_http` loop over the build output directory. Requests
//! resolve to files on disk (with `index.html` for directories); nothing is
//! rewritten on the way out, so what you preview is exactly what deploys.

use crate::{config::SiteConfig, log};
use anyhow::{Context, Result, anyhow};
use std::{fs, io::Cursor, net::SocketAddr, path::Path, path::PathBuf, sync::Arc};
use tiny_http::{Header, Request, Response, Server, StatusCode};

/// How many consecutive ports to try when the configured one is taken.
const PORT_RETRIES: u16 = 10;

/// MIME types by file extension; anything else is served as a binary blob.
const MIME_TABLE: &[(&str, &str)] = &[
    ("html", "text/html; charset=utf-8"),
    ("htm", "text/html; charset=utf-8"),
    ("css", "text/css; charset=utf-8"),
    ("js", "application/javascript; charset=utf-8"),
    ("mjs", "application/javascript; charset=utf-8"),
    ("json", "application/json; charset=utf-8"),
    ("xml", "application/xml; charset=utf-8"),
    ("svg", "image/svg+xml"),
    ("png", "image/png"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("gif", "image/gif"),
    ("webp", "image/webp"),
    ("ico", "image/x-icon"),
    ("pdf", "application/pdf"),
    ("txt", "text/plain; charset=utf-8"),
    ("md", "text/markdown; charset=utf-8"),
];

// ============================================================================
// Server loop
// ============================================================================

/// Bind the configured interface and serve the output directory until
/// interrupted.
pub fn serve_site(config: &'static SiteConfig) -> Result<()> {
    let interface: std::net::IpAddr = config
        .serve
        .interface
        .parse()
        .with_context(|| format!("Invalid [serve.interface]: {}", config.serve.interface))?;

    let (server, addr) = bind_with_retry(interface, config.serve.port)?;
    let server = Arc::new(server);

    let handle = Arc::clone(&server);
    ctrlc::set_handler(move || {
        log!("serve"; "shutting down");
        handle.unblock();
    })
    .context("Failed to set Ctrl+C handler")?;

    log!("serve"; "serving {} at http://{addr}", config.build.output.display());

    for request in server.incoming_requests() {
        let outcome = match resolve(request.url(), &config.build.output) {
            Some(file) => respond_with_file(request, &file),
            None => {
                log!("serve"; "404 {}", request.url());
                respond_not_found(request)
            }
        };
        if let Err(err) = outcome {
            log!("error"; "{err:#}");
        }
    }

    Ok(())
}

/// Bind `port`, walking upward through the next few ports if it is taken.
fn bind_with_retry(interface: std::net::IpAddr, port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_err = None;
    for candidate in port..port.saturating_add(PORT_RETRIES) {
        let addr = SocketAddr::new(interface, candidate);
        match Server::http(addr) {
            Ok(server) => {
                if candidate != port {
                    log!("serve"; "port {port} in use, bound {candidate} instead");
                }
                return Ok((server, addr));
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(anyhow!(
        "No free port in {}..{}: {}",
        port,
        port.saturating_add(PORT_RETRIES),
        last_err.map_or_else(|| "unknown".to_owned(), |e| e.to_string())
    ))
}

// ============================================================================
// Resolution and responses
// ============================================================================

/// Map a request URL to a file under `root`, if one exists.
///
/// The query string is ignored; percent-escapes are decoded; directories
/// resolve to their `index.html`.
fn resolve(url: &str, root: &Path) -> Option<PathBuf> {
    let decoded = urlencoding::decode(url).ok()?;
    let path_part = decoded.split('?').next().unwrap_or(&decoded);
    let candidate = root.join(path_part.trim_matches('/'));

    if candidate.is_file() {
        return Some(candidate);
    }
    let index = candidate.join("index.html");
    index.is_file().then_some(index)
}

fn respond_with_file(request: Request, path: &Path) -> Result<()> {
    let content = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let response = Response::from_data(content)
        .with_header(Header::from_bytes("Content-Type", content_type(path)).unwrap());
    request.respond(response)?;
    Ok(())
}

fn respond_not_found(request: Request) -> Result<()> {
    let body = "404 Not Found";
    let response = Response::new(
        StatusCode(404),
        vec![Header::from_bytes("Content-Type", "text/plain").unwrap()],
        Cursor::new(body),
        Some(body.len()),
        None,
    );
    request.respond(response)?;
    Ok(())
}

fn content_type(path: &Path) -> &'static str {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(|ext| {
            MIME_TABLE
                .iter()
                .find(|(known, _)| ext.eq_ignore_ascii_case(known))
        })
        .map_or("application/octet-stream", |(_, mime)| mime)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_type_lookup() {
        assert_eq!(content_type(Path::new("index.html")), "text/html; charset=utf-8");
        assert_eq!(content_type(Path::new("a.PNG")), "image/png");
        assert_eq!(content_type(Path::new("blob.bin")), "application/octet-stream");
        assert_eq!(content_type(Path::new("no-extension")), "application/octet-stream");
    }

    #[test]
    fn test_resolve_file_and_index() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("guide")).unwrap();
        fs::write(dir.path().join("guide/index.html"), "x").unwrap();
        fs::write(dir.path().join("style.css"), "x").unwrap();

        assert_eq!(
            resolve("/style.css", dir.path()),
            Some(dir.path().join("style.css"))
        );
        assert_eq!(
            resolve("/guide/", dir.path()),
            Some(dir.path().join("guide/index.html"))
        );
        assert_eq!(resolve("/missing/", dir.path()), None);
    }

    #[test]
    fn test_resolve_strips_query_and_decodes() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a b.txt"), "x").unwrap();

        assert_eq!(
            resolve("/a%20b.txt?cache=1", dir.path()),
            Some(dir.path().join("a b.txt"))
        );
    }
}
