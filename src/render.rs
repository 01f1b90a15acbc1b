//! Rendering PlantUML text to SVG on a PlantUML server.

use std::thread;
use std::time::Duration;

use log::{debug, warn};
use thiserror::Error;

pub const DEFAULT_SERVER_URL: &str = "https://www.plantuml.com/plantuml";

/// The public server answers 403 when it is throttling; one retry after this delay.
const THROTTLE_DELAY: Duration = Duration::from_secs(2);
const THROTTLED: u16 = 403;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("PlantUML server responded with HTTP status {0}")]
    Status(u16),

    #[error("request to PlantUML server failed: {0}")]
    Http(#[source] ureq::Error),
}

impl From<ureq::Error> for RenderError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::StatusCode(status) => RenderError::Status(status),
            other => RenderError::Http(other),
        }
    }
}

/// `<server>/svg`, tolerating a trailing slash on the server URL.
pub fn svg_endpoint(server_url: &str) -> String {
    format!("{}/svg", server_url.trim_end_matches('/'))
}

/// Render `plant_uml` to SVG text using the server at `server_url`.
pub fn render_svg(plant_uml: &str, server_url: &str) -> Result<String, RenderError> {
    let endpoint = svg_endpoint(server_url);
    debug!(endpoint = endpoint.clone(), bytes = plant_uml.len(); "Requesting SVG rendering");

    match post(&endpoint, plant_uml) {
        Err(ureq::Error::StatusCode(THROTTLED)) => {
            warn!(endpoint = endpoint.clone(); "PlantUML server is throttling, retrying once");
            thread::sleep(THROTTLE_DELAY);
            Ok(post(&endpoint, plant_uml)?)
        }
        other => Ok(other?),
    }
}

fn post(endpoint: &str, body: &str) -> Result<String, ureq::Error> {
    let mut response = ureq::post(endpoint)
        .content_type("text/plain; charset=utf-8")
        .send(body)?;
    response.body_mut().read_to_string()
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    use super::*;

    /// Serve one canned response per entry in `statuses`, returning the request bodies.
    fn serve(statuses: Vec<u16>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/plantuml/", listener.local_addr().unwrap());
        let handle = thread::spawn(move || {
            let mut bodies = Vec::new();
            for status in statuses {
                let (stream, _) = listener.accept().unwrap();
                let mut reader = BufReader::new(stream);
                let mut length = 0;
                loop {
                    let mut line = String::new();
                    reader.read_line(&mut line).unwrap();
                    let line = line.trim_end();
                    if line.is_empty() {
                        break;
                    }
                    if let Some((name, value)) = line.split_once(':') {
                        if name.eq_ignore_ascii_case("content-length") {
                            length = value.trim().parse().unwrap();
                        }
                    }
                }
                let mut body = vec![0; length];
                reader.read_exact(&mut body).unwrap();
                bodies.push(String::from_utf8(body).unwrap());

                let payload = if status == 200 { "<svg/>" } else { "" };
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: image/svg+xml\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{payload}",
                    payload.len()
                );
                reader.get_mut().write_all(response.as_bytes()).unwrap();
            }
            bodies
        });
        (url, handle)
    }

    #[test]
    fn endpoint_ignores_trailing_slash() {
        assert_eq!(svg_endpoint("http://host/plantuml/"), "http://host/plantuml/svg");
        assert_eq!(svg_endpoint(DEFAULT_SERVER_URL), "https://www.plantuml.com/plantuml/svg");
    }

    #[test]
    fn posts_diagram_text() {
        let (url, server) = serve(vec![200]);
        let svg = render_svg("@startuml\n@enduml\n", &url).expect("rendered");
        assert_eq!(svg, "<svg/>");
        assert_eq!(server.join().unwrap(), ["@startuml\n@enduml\n"]);
    }

    #[test]
    fn throttling_is_retried_once() {
        let (url, server) = serve(vec![403, 200]);
        assert_eq!(render_svg("x", &url).expect("second attempt"), "<svg/>");
        assert_eq!(server.join().unwrap().len(), 2);
    }

    #[test]
    fn other_statuses_are_errors() {
        let (url, server) = serve(vec![500]);
        let err = render_svg("x", &url).unwrap_err();
        assert!(matches!(err, RenderError::Status(500)), "{err:?}");
        server.join().unwrap();
    }
}
