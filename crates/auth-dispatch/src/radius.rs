//! Minimal client-side RADIUS transport (RFC 2865)
//!
//! Sends one Access-Request per call over an ephemeral UDP socket and reads
//! one reply. Only the attributes a credential-pair check needs are encoded:
//! User-Name(1), User-Password(2) with the MD5-XOR hiding scheme, and
//! NAS-IP-Address(4). The Response Authenticator is verified before the
//! reply code is trusted.
//!
//! Retransmission is deliberately absent: the dispatcher's shared deadline
//! already bounds every call and a lost datagram just becomes a timeout.

use crate::backend::Backend;
use crate::error::TransportError;
use crate::transport::AuthTransport;
use async_trait::async_trait;
use rand::Rng;
use std::net::Ipv4Addr;
use tokio::net::UdpSocket;
use tracing::debug;

const CODE_ACCESS_REQUEST: u8 = 1;
const CODE_ACCESS_ACCEPT: u8 = 2;
const CODE_ACCESS_REJECT: u8 = 3;

const ATTR_USER_NAME: u8 = 1;
const ATTR_USER_PASSWORD: u8 = 2;
const ATTR_NAS_IP_ADDRESS: u8 = 4;

const HEADER_LEN: usize = 20;
const MAX_PACKET: usize = 4096;

/// UDP RADIUS client transport
#[derive(Debug, Clone)]
pub struct RadiusTransport {
    /// NAS-IP-Address advertised in requests
    nas_ip: Ipv4Addr,
}

impl RadiusTransport {
    pub fn new(nas_ip: Ipv4Addr) -> Self {
        RadiusTransport { nas_ip }
    }
}

impl Default for RadiusTransport {
    fn default() -> Self {
        RadiusTransport::new(Ipv4Addr::LOCALHOST)
    }
}

#[async_trait]
impl AuthTransport for RadiusTransport {
    async fn authenticate(
        &self,
        backend: &Backend,
        username: &str,
        password: &str,
    ) -> Result<bool, TransportError> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect(backend.address).await?;

        // ThreadRng is !Send, keep it out of scope before the socket awaits
        let (identifier, authenticator) = {
            let mut rng = rand::rng();
            let identifier: u8 = rng.random();
            let mut authenticator = [0u8; 16];
            rng.fill(&mut authenticator);
            (identifier, authenticator)
        };

        let request = encode_access_request(
            identifier,
            &authenticator,
            username,
            password,
            backend.secret(),
            self.nas_ip,
        )?;
        socket.send(&request).await?;

        debug!(
            backend = %backend.name,
            identifier = identifier,
            "Access-Request sent"
        );

        // Datagrams with the wrong identifier are stray replies to earlier
        // sockets on a reused port; skip them and keep reading.
        let mut buf = [0u8; MAX_PACKET];
        loop {
            let len = socket.recv(&mut buf).await?;
            let reply = &buf[..len];

            if reply.len() < HEADER_LEN {
                return Err(TransportError::Protocol(format!(
                    "Reply too short: {} bytes",
                    reply.len()
                )));
            }
            if reply[1] != identifier {
                continue;
            }

            let declared_len = u16::from_be_bytes([reply[2], reply[3]]) as usize;
            if declared_len < HEADER_LEN || declared_len > reply.len() {
                return Err(TransportError::Protocol(format!(
                    "Bad declared length {} in {}-byte reply",
                    declared_len,
                    reply.len()
                )));
            }
            let reply = &reply[..declared_len];

            if !verify_response_authenticator(reply, &authenticator, backend.secret()) {
                return Err(TransportError::BadAuthenticator);
            }

            return match reply[0] {
                CODE_ACCESS_ACCEPT => Ok(true),
                CODE_ACCESS_REJECT => Ok(false),
                code => Err(TransportError::Protocol(format!(
                    "Unexpected reply code: {}",
                    code
                ))),
            };
        }
    }
}

/// Encode a complete Access-Request packet
fn encode_access_request(
    identifier: u8,
    authenticator: &[u8; 16],
    username: &str,
    password: &str,
    secret: &[u8],
    nas_ip: Ipv4Addr,
) -> Result<Vec<u8>, TransportError> {
    let mut packet = Vec::with_capacity(128);
    packet.push(CODE_ACCESS_REQUEST);
    packet.push(identifier);
    packet.extend_from_slice(&[0, 0]); // length, patched below
    packet.extend_from_slice(authenticator);

    push_attribute(&mut packet, ATTR_USER_NAME, username.as_bytes())?;
    let hidden = encrypt_user_password(password, secret, authenticator);
    push_attribute(&mut packet, ATTR_USER_PASSWORD, &hidden)?;
    push_attribute(&mut packet, ATTR_NAS_IP_ADDRESS, &nas_ip.octets())?;

    if packet.len() > MAX_PACKET {
        return Err(TransportError::Protocol(format!(
            "Request too large: {} bytes",
            packet.len()
        )));
    }
    let len = packet.len() as u16;
    packet[2..4].copy_from_slice(&len.to_be_bytes());
    Ok(packet)
}

/// Append one type-length-value attribute
fn push_attribute(packet: &mut Vec<u8>, attr_type: u8, value: &[u8]) -> Result<(), TransportError> {
    // Length octet covers type + length + value
    let total = value.len() + 2;
    if value.is_empty() || total > 255 {
        return Err(TransportError::Protocol(format!(
            "Attribute {} value length {} out of range",
            attr_type,
            value.len()
        )));
    }
    packet.push(attr_type);
    packet.push(total as u8);
    packet.extend_from_slice(value);
    Ok(())
}

/// Hide a User-Password per RFC 2865 Section 5.2
///
/// The password is null-padded to a 16-byte multiple and XORed block by
/// block with `MD5(secret + previous_block)`, seeded by the Request
/// Authenticator.
pub fn encrypt_user_password(password: &str, secret: &[u8], authenticator: &[u8; 16]) -> Vec<u8> {
    let mut padded = password.as_bytes().to_vec();
    let padding = (16 - (padded.len() % 16)) % 16;
    padded.resize(padded.len() + padding, 0);
    if padded.is_empty() {
        padded.resize(16, 0);
    }

    let mut result = Vec::with_capacity(padded.len());
    let mut previous = authenticator.to_vec();

    for chunk in padded.chunks(16) {
        let mut data = secret.to_vec();
        data.extend_from_slice(&previous);
        let hash = md5::compute(&data);

        let mut block = [0u8; 16];
        for (i, out) in block.iter_mut().enumerate() {
            *out = chunk[i] ^ hash.0[i];
        }

        previous = block.to_vec();
        result.extend_from_slice(&block);
    }

    result
}

/// Recover a hidden User-Password (test support)
#[cfg(test)]
pub fn decrypt_user_password(
    hidden: &[u8],
    secret: &[u8],
    authenticator: &[u8; 16],
) -> Result<String, TransportError> {
    if hidden.is_empty() || hidden.len() % 16 != 0 {
        return Err(TransportError::Protocol(
            "Invalid hidden password length".to_string(),
        ));
    }

    let mut result = Vec::with_capacity(hidden.len());
    let mut previous = authenticator.to_vec();

    for chunk in hidden.chunks(16) {
        let mut data = secret.to_vec();
        data.extend_from_slice(&previous);
        let hash = md5::compute(&data);

        for (i, &byte) in chunk.iter().enumerate() {
            result.push(byte ^ hash.0[i]);
        }
        previous = chunk.to_vec();
    }

    while result.last() == Some(&0) {
        result.pop();
    }

    String::from_utf8(result)
        .map_err(|e| TransportError::Protocol(format!("Invalid UTF-8 in password: {}", e)))
}

/// Verify a Response Authenticator per RFC 2865 Section 3
///
/// `MD5(code + id + length + request_authenticator + attributes + secret)`
/// must equal the authenticator field of the reply.
pub fn verify_response_authenticator(
    reply: &[u8],
    request_authenticator: &[u8; 16],
    secret: &[u8],
) -> bool {
    if reply.len() < HEADER_LEN {
        return false;
    }

    let mut data = Vec::with_capacity(reply.len() + secret.len());
    data.extend_from_slice(&reply[..4]);
    data.extend_from_slice(request_authenticator);
    data.extend_from_slice(&reply[HEADER_LEN..]);
    data.extend_from_slice(secret);

    md5::compute(&data).0 == reply[4..HEADER_LEN]
}
