use base64::{engine::general_purpose::STANDARD, Engine as _};
use chardetng::EncodingDetector;
use encoding_rs::Encoding;
use http::StatusCode;
use openssl::ssl::{SslConnector, SslMethod};
use percent_encoding::percent_decode_str;
use std::{
    borrow::Cow,
    collections::HashMap,
    fmt::Display,
    fs,
    io::{self, BufRead, BufReader, Read, Write},
    net::TcpStream,
    str,
    str::FromStr,
};
use thiserror::Error;
use url::{Position, Url};

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("unsupported scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("unsupported data url type `{0}`")]
    UnsupportedDataType(String),
    #[error("malformed location {0}")]
    MalformedLocation(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    #[error("tls: {0}")]
    Tls(String),
    #[error(transparent)]
    Io(#[from] io::Error),
}

fn malformed(location: &str, reason: impl Display) -> RequestError {
    RequestError::MalformedLocation(format!("`{}`: {}", location, reason))
}

#[derive(Debug, Default)]
pub struct Response {
    pub status: StatusCode,
    pub headers: Option<HashMap<String, String>>,
    pub body: Vec<u8>,
}

impl Response {
    fn ok(body: Vec<u8>) -> Self {
        Response {
            status: StatusCode::OK,
            headers: None,
            body,
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .as_ref()
            .and_then(|headers| headers.get(&name.to_ascii_lowercase()))
            .map(String::as_str)
    }

    /// Charset label from the `Content-Type` header, if one is declared.
    fn declared_charset(&self) -> Option<&'static Encoding> {
        let content_type = self.header("content-type")?;
        content_type
            .split(';')
            .skip(1)
            .filter_map(|param| param.split_once('='))
            .find(|(key, _)| key.trim().eq_ignore_ascii_case("charset"))
            .and_then(|(_, label)| Encoding::for_label(label.trim().trim_matches('"').as_bytes()))
    }

    /// Decodes the body the way a browser fills `responseText`: the declared
    /// charset, then UTF-8, then a detected one. Never fails; bytes the final
    /// encoding cannot map become U+FFFD.
    pub fn body_to_string(&self) -> Cow<'_, str> {
        if let Some(encoding) = self.declared_charset() {
            let (body, _, has_error) = encoding.decode(&self.body);
            if !has_error {
                return body;
            }
        }
        if let Ok(body) = str::from_utf8(&self.body) {
            return Cow::Borrowed(body);
        }

        let mut detector = EncodingDetector::new();
        detector.feed(&self.body, true);
        let (body, _, _) = detector.guess(None, true).decode(&self.body);
        body
    }
}

/// Options for a single GET exchange.
#[derive(Debug, Clone, Copy)]
pub struct RequestOptions<'a> {
    pub user_agent: &'a str,
    pub base_url: Option<&'a str>,
}

/// Resolves `location` against `base` per RFC 3986. Absolute locations
/// ignore the base; relative ones need it.
pub fn resolve(location: &str, base: Option<&str>) -> Result<Url, RequestError> {
    match Url::parse(location) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let base = base.ok_or_else(|| malformed(location, "relative location without a base url"))?;
            Url::parse(base)
                .and_then(|base| base.join(location))
                .map_err(|e| malformed(location, e))
        }
        Err(e) => Err(malformed(location, e)),
    }
}

fn is_data_url(location: &str) -> bool {
    location
        .get(..5)
        .is_some_and(|scheme| scheme.eq_ignore_ascii_case("data:"))
}

pub fn request(location: &str, options: RequestOptions<'_>) -> Result<Response, RequestError> {
    // Kept out of `Url` so the payload is decoded exactly once, below.
    if is_data_url(location) {
        return parse_data(location);
    }
    let url = resolve(location, options.base_url)?;
    match url.scheme() {
        "data" => parse_data(url.as_str()),
        "file" => {
            let path = url
                .to_file_path()
                .map_err(|_| malformed(url.as_str(), "not a local file path"))?;
            Ok(Response::ok(fs::read(path)?))
        }
        "http" | "https" => fetch(&url, options.user_agent),
        other => Err(RequestError::UnsupportedScheme(other.to_string())),
    }
}

fn fetch(url: &Url, user_agent: &str) -> Result<Response, RequestError> {
    let host = url
        .host_str()
        .ok_or_else(|| malformed(url.as_str(), "missing host"))?;
    let authority = match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    };
    let target = &url[Position::BeforePath..Position::AfterQuery];
    let addrs = url.socket_addrs(|| None)?;
    let s = TcpStream::connect(&*addrs)?;
    match url.scheme() {
        "http" => online_access(s, &authority, target, user_agent),
        _ => {
            let connector = SslConnector::builder(SslMethod::tls())
                .map_err(|e| RequestError::Tls(e.to_string()))?
                .build();
            let domain = host.trim_start_matches('[').trim_end_matches(']');
            let tls = connector
                .connect(domain, s)
                .map_err(|e| RequestError::Tls(e.to_string()))?;
            online_access(tls, &authority, target, user_agent)
        }
    }
}

fn online_access<S: Read + Write>(
    mut s: S,
    host: &str,
    target: &str,
    user_agent: &str,
) -> Result<Response, RequestError> {
    s.write_all(
        format!(
            "GET {} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\nUser-Agent: {}\r\n\r\n",
            target, host, user_agent
        )
        .as_bytes(),
    )?;
    s.flush()?;
    let mut reader = BufReader::new(s);
    let mut buf = String::new();
    reader.read_line(&mut buf)?;
    let status = parse_status_line(&buf)?;

    let mut headers: HashMap<String, String> = HashMap::new();
    for line in reader.by_ref().lines() {
        let line = line?;
        if line.is_empty() {
            break;
        }
        let (header, value) = line
            .split_once(':')
            .ok_or_else(|| RequestError::MalformedResponse(format!("bad header `{}`", line)))?;
        headers.insert(header.to_lowercase(), value.trim().to_string());
    }

    let body = read_body(&mut reader, &headers)?;
    Ok(Response {
        status,
        headers: Some(headers),
        body,
    })
}

fn parse_status_line(line: &str) -> Result<StatusCode, RequestError> {
    let line = line.trim_end();
    let (_version, rest) = line
        .split_once(' ')
        .ok_or_else(|| RequestError::MalformedResponse(format!("bad status line `{}`", line)))?;
    let status = rest.split_once(' ').map_or(rest, |(status, _reason)| status);
    StatusCode::from_str(status)
        .map_err(|_| RequestError::MalformedResponse(format!("bad status code `{}`", status)))
}

fn read_body<R: BufRead>(
    reader: &mut R,
    headers: &HashMap<String, String>,
) -> Result<Vec<u8>, RequestError> {
    let chunked = headers
        .get("transfer-encoding")
        .is_some_and(|te| te.to_ascii_lowercase().contains("chunked"));
    if chunked {
        return read_chunked(reader);
    }
    let mut body: Vec<u8> = Vec::new();
    match headers.get("content-length") {
        Some(len) => {
            let len = len
                .parse::<u64>()
                .map_err(|_| RequestError::MalformedResponse(format!("bad content-length `{}`", len)))?;
            reader.take(len).read_to_end(&mut body)?;
        }
        None => {
            reader.read_to_end(&mut body)?;
        }
    }
    Ok(body)
}

/// Reads a chunked body. Memory grows with the bytes that arrive, not with
/// the sizes the server announces.
fn read_chunked<R: BufRead>(reader: &mut R) -> Result<Vec<u8>, RequestError> {
    let mut body = Vec::new();
    loop {
        let mut size_line = String::new();
        if reader.read_line(&mut size_line)? == 0 {
            return Err(RequestError::MalformedResponse("truncated chunked body".into()));
        }
        let size = size_line.trim().split(';').next().unwrap_or("");
        let size = u64::from_str_radix(size, 16)
            .map_err(|_| RequestError::MalformedResponse(format!("bad chunk size `{}`", size)))?;
        if size == 0 {
            break;
        }
        let read = reader.by_ref().take(size).read_to_end(&mut body)?;
        if read as u64 != size {
            return Err(RequestError::MalformedResponse(format!(
                "chunk announced {} bytes, got {}",
                size, read
            )));
        }
        let mut crlf = [0u8; 2];
        reader.read_exact(&mut crlf)?;
    }
    Ok(body)
}

/// Decodes a `data:` URL payload: percent-escapes first, then base64 when the
/// `;base64` parameter is present.
fn parse_data(url: &str) -> Result<Response, RequestError> {
    let rest = &url["data:".len()..];
    let rest = rest.split_once('#').map_or(rest, |(before, _fragment)| before);
    let (metadata, payload) = rest
        .split_once(',')
        .ok_or_else(|| malformed(url, "data url without a comma"))?;
    let mut params = metadata.split(';').map(|param| param.trim());
    let media_type = params.next().unwrap_or("");
    let is_base64 = params.any(|param| param.eq_ignore_ascii_case("base64"));
    if !media_type.is_empty() && !media_type.eq_ignore_ascii_case("text/html") {
        return Err(RequestError::UnsupportedDataType(media_type.to_string()));
    }

    let bytes: Vec<u8> = percent_decode_str(payload).collect();
    if !is_base64 {
        return Ok(Response::ok(bytes));
    }
    let compact: Vec<u8> = bytes
        .into_iter()
        .filter(|b| !b.is_ascii_whitespace())
        .collect();
    let body = STANDARD
        .decode(&compact)
        .map_err(|e| malformed(url, e))?;
    Ok(Response::ok(body))
}
