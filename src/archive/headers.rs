use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use hyper::http::HeaderValue;
use hyper::HeaderMap;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::archive::ArchiveRequest;
use crate::error::archive as ArchiveError;
use crate::error::Error;

// RFC 5987 attr-char.
const ATTR: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

/// Headers of a streamed archive. No length is announced, the body is chunked.
pub fn archive_headers(request: &ArchiveRequest, content_type: &HeaderValue) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, content_type.clone());
    headers.insert(
        CONTENT_DISPOSITION,
        HeaderValue::try_from(content_disposition(request.filename()))
            .map_err(|_| ArchiveError::Header)?,
    );
    Ok(headers)
}

fn content_disposition(filename: &str) -> String {
    let fallback = filename
        .chars()
        .map(|c| if c.is_ascii() && !c.is_ascii_control() { c } else { '_' })
        .collect::<String>();
    if fallback == filename {
        format!(r#"attachment; filename="{}""#, filename)
    } else {
        format!(
            r#"attachment; filename="{}"; filename*=UTF-8''{}"#,
            fallback,
            utf8_percent_encode(filename, ATTR)
        )
    }
}

#[cfg(test)]
mod tests {
    use hyper::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
    use hyper::http::HeaderValue;

    use super::{archive_headers, content_disposition};
    use crate::archive::ArchiveRequest;
    use crate::storage::Root;

    #[test]
    fn disposition() {
        assert_eq!(
            content_disposition("abc123.zip"),
            r#"attachment; filename="abc123.zip""#
        );
        assert_eq!(
            content_disposition("été 2022.zip"),
            r#"attachment; filename="_t_ 2022.zip"; filename*=UTF-8''%C3%A9t%C3%A9%202022.zip"#
        );
    }

    #[tokio::test]
    async fn headers() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("abc123")).unwrap();
        let root = Root::open(dir.path()).await.unwrap();
        let request = ArchiveRequest::resolve(&root, "abc123", "zip").await.unwrap();

        let headers =
            archive_headers(&request, &HeaderValue::from_static("application/zip")).unwrap();
        assert_eq!(headers[CONTENT_TYPE], "application/zip");
        assert_eq!(
            headers[CONTENT_DISPOSITION],
            r#"attachment; filename="abc123.zip""#
        );
    }
}
