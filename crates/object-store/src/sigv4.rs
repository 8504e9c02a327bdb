//! Minimal AWS Signature Version 4 signing for S3-style PUTs.
//!
//! Covers exactly what the upload client needs: path-style requests
//! with an unsigned streaming payload. Header names passed in must be
//! lowercase and sorted.

use hmac::{Hmac, Mac};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Payload hash sentinel for streaming bodies.
pub const UNSIGNED_PAYLOAD: &str = "UNSIGNED-PAYLOAD";

const SERVICE: &str = "s3";

/// Everything needed to sign one request.
pub(crate) struct SignRequest<'a> {
    pub method: &'a str,
    /// Path portion of the URL, already percent-encoded.
    pub canonical_uri: &'a str,
    pub canonical_query: &'a str,
    /// `(lowercase-name, trimmed-value)` pairs, sorted by name.
    pub headers: &'a [(&'a str, &'a str)],
    pub payload_hash: &'a str,
    /// `YYYYMMDD'T'HHMMSS'Z'`.
    pub amz_date: &'a str,
    /// `YYYYMMDD`.
    pub datestamp: &'a str,
    pub region: &'a str,
    pub access_key: &'a str,
    pub secret_key: &'a str,
}

/// Bytes that stay literal in an encoded key path. `/` separates key
/// segments and is preserved.
const KEY_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~')
    .remove(b'/');

/// Percent-encodes an object key for use in both the request URL and
/// the canonical URI.
pub(crate) fn uri_encode_path(path: &str) -> String {
    utf8_percent_encode(path, KEY_ENCODE_SET).to_string()
}

pub(crate) fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Vec<u8> {
    let mut mac = HmacSha256::new_from_slice(key).expect("HMAC-SHA256 accepts any key length");
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

/// Derives the per-day signing key.
pub(crate) fn signing_key(secret_key: &str, datestamp: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac_sha256(format!("AWS4{secret_key}").as_bytes(), datestamp.as_bytes());
    let k_region = hmac_sha256(&k_date, region.as_bytes());
    let k_service = hmac_sha256(&k_region, service.as_bytes());
    hmac_sha256(&k_service, b"aws4_request")
}

/// Computes the `Authorization` header value for `req`.
pub(crate) fn authorization_header(req: &SignRequest<'_>) -> String {
    let canonical_headers: String = req
        .headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    let signed_headers = req
        .headers
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(";");

    let canonical_request = format!(
        "{}\n{}\n{}\n{}\n{}\n{}",
        req.method,
        req.canonical_uri,
        req.canonical_query,
        canonical_headers,
        signed_headers,
        req.payload_hash
    );

    let scope = format!("{}/{}/{}/aws4_request", req.datestamp, req.region, SERVICE);
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{}\n{}\n{}",
        req.amz_date,
        scope,
        sha256_hex(canonical_request.as_bytes())
    );

    let key = signing_key(req.secret_key, req.datestamp, req.region, SERVICE);
    let signature = hex::encode(hmac_sha256(&key, string_to_sign.as_bytes()));

    format!(
        "AWS4-HMAC-SHA256 Credential={}/{}, SignedHeaders={}, Signature={}",
        req.access_key, scope, signed_headers, signature
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_payload_hash() {
        // SHA-256 of the empty string.
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn signing_key_matches_aws_example() {
        // The worked example from the AWS SigV4 documentation.
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn key_encoding_preserves_slashes() {
        assert_eq!(
            uri_encode_path("uploads/123456/1700_my file.zip"),
            "uploads/123456/1700_my%20file.zip"
        );
    }

    #[test]
    fn key_encoding_escapes_special_bytes() {
        assert_eq!(uri_encode_path("a+b&c=d"), "a%2Bb%26c%3Dd");
        assert_eq!(uri_encode_path("safe-name_1.2~3"), "safe-name_1.2~3");
    }

    #[test]
    fn authorization_header_shape() {
        let auth = authorization_header(&SignRequest {
            method: "PUT",
            canonical_uri: "/bucket/uploads/123456/1_file.txt",
            canonical_query: "",
            headers: &[
                ("content-type", "text/plain"),
                ("host", "gw.example.com"),
                ("x-amz-content-sha256", UNSIGNED_PAYLOAD),
                ("x-amz-date", "20260827T120000Z"),
            ],
            payload_hash: UNSIGNED_PAYLOAD,
            amz_date: "20260827T120000Z",
            datestamp: "20260827",
            region: "us-east-1",
            access_key: "AKIDEXAMPLE",
            secret_key: "secret",
        });

        assert!(auth.starts_with(
            "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20260827/us-east-1/s3/aws4_request, "
        ));
        assert!(auth.contains(
            "SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date, "
        ));
        // Hex signature, 32 bytes.
        let sig = auth.rsplit("Signature=").next().unwrap();
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn signature_is_deterministic() {
        let req = SignRequest {
            method: "PUT",
            canonical_uri: "/b/k",
            canonical_query: "",
            headers: &[("host", "h")],
            payload_hash: UNSIGNED_PAYLOAD,
            amz_date: "20260827T120000Z",
            datestamp: "20260827",
            region: "us-east-1",
            access_key: "AK",
            secret_key: "SK",
        };
        assert_eq!(authorization_header(&req), authorization_header(&req));
    }
}
