// Copyright (c) 2022 RBB S.r.l
// opensource@mintlayer.org
// SPDX-License-Identifier: MIT
// Licensed under the MIT License;
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://github.com/mintlayer/mintlayer-core/blob/master/LICENSE
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A fire-and-forget external-IP probe speaking the RFC 3489 BIND-REQUEST.
//! Its whole contract is: given entropy, return one observed external IPv4
//! endpoint (and which server answered), or fail. The UDP exchange sits
//! behind a trait so the walk and parsing are testable without sockets.

use std::net::{SocketAddrV4, UdpSocket};
use std::time::Duration;

use logging::log;

const BIND_REQUEST: u16 = 0x0001;
const BIND_RESPONSE: u16 = 0x0101;
const ATTR_MAPPED_ADDRESS: u16 = 0x0001;
const FAMILY_IPV4: u8 = 0x01;

/// Per-server exchange timeout.
const EXCHANGE_TIMEOUT: Duration = Duration::from_secs(3);

/// Stir table for the transaction-id generator.
const STIR: [u32; 16] = [
    0x9e37_79b9, 0x7f4a_7c15, 0xf39c_ac93, 0x41c6_4e6d, 0x6549_7da5, 0x2545_f491, 0x8088_405f,
    0x4c95_7f2d, 0x5851_f42d, 0x4064_1362, 0x9b60_93cd, 0x2c9277b5, 0x6c07_8965, 0x5d58_8b65,
    0xd1a4_f389, 0x1534_6d0b,
];

pub trait StunTransport {
    /// Send `request` to `server` ("host:port") and return the raw reply.
    fn exchange(
        &self,
        server: &str,
        request: &[u8],
        timeout: Duration,
    ) -> std::io::Result<Vec<u8>>;
}

/// The production transport: one ephemeral UDP socket per probe.
pub struct UdpTransport;

impl StunTransport for UdpTransport {
    fn exchange(
        &self,
        server: &str,
        request: &[u8],
        timeout: Duration,
    ) -> std::io::Result<Vec<u8>> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        socket.set_read_timeout(Some(timeout))?;
        socket.send_to(request, server)?;
        let mut buffer = [0u8; 512];
        let (len, _) = socket.recv_from(&mut buffer)?;
        Ok(buffer[..len].to_vec())
    }
}

/// Derive the 16-byte transaction id from 64 bits of entropy: four 32-bit
/// words seeded from the entropy are alternately OR-ed and AND-ed with the
/// `0x55555555` bit pattern, then each byte is stirred through
/// `x ← rotl5(x) + S[b] ^ k` over the constant table.
fn make_transaction_id(entropy: u64) -> [u8; 16] {
    const PATTERN: u32 = 0x5555_5555;
    let mut words = [
        entropy as u32,
        (entropy >> 32) as u32,
        (entropy as u32).rotate_left(16),
        ((entropy >> 32) as u32).rotate_left(16),
    ];
    for (i, word) in words.iter_mut().enumerate() {
        if i % 2 == 0 {
            *word |= PATTERN;
        } else {
            *word &= PATTERN;
        }
    }

    let mut id = [0u8; 16];
    let mut x = entropy;
    for (i, slot) in id.iter_mut().enumerate() {
        let byte = (words[i / 4] >> (8 * (i % 4))) as u8;
        x = x
            .rotate_left(5)
            .wrapping_add(u64::from(STIR[(byte & 0x0F) as usize]))
            ^ u64::from(STIR[(byte >> 4) as usize]);
        *slot = (x as u8) ^ byte;
    }
    id
}

fn make_bind_request(transaction_id: &[u8; 16]) -> Vec<u8> {
    let mut request = Vec::with_capacity(20);
    request.extend_from_slice(&BIND_REQUEST.to_be_bytes());
    request.extend_from_slice(&0u16.to_be_bytes());
    request.extend_from_slice(transaction_id);
    request
}

fn parse_bind_response(response: &[u8], transaction_id: &[u8; 16]) -> Option<SocketAddrV4> {
    if response.len() < 20 {
        return None;
    }
    let msg_type = u16::from_be_bytes([response[0], response[1]]);
    let msg_len = u16::from_be_bytes([response[2], response[3]]) as usize;
    if msg_type != BIND_RESPONSE || response.len() < 20 + msg_len {
        return None;
    }
    if &response[4..20] != transaction_id {
        return None;
    }

    let mut attrs = &response[20..20 + msg_len];
    while attrs.len() >= 4 {
        let attr_type = u16::from_be_bytes([attrs[0], attrs[1]]);
        let attr_len = u16::from_be_bytes([attrs[2], attrs[3]]) as usize;
        let value = attrs.get(4..4 + attr_len)?;
        if attr_type == ATTR_MAPPED_ADDRESS && attr_len >= 8 && value[1] == FAMILY_IPV4 {
            let port = u16::from_be_bytes([value[2], value[3]]);
            let ip = std::net::Ipv4Addr::new(value[4], value[5], value[6], value[7]);
            return Some(SocketAddrV4::new(ip, port));
        }
        attrs = &attrs[4 + attr_len..];
    }
    None
}

/// Walk the server list pseudo-randomly and return the first mapped
/// address observed, along with the index of the answering server. Gives
/// up after `2 × list length` probes.
pub fn get_external_ip_by_stun(
    entropy: u64,
    servers: &[impl AsRef<str>],
    transport: &impl StunTransport,
) -> Option<(SocketAddrV4, usize)> {
    if servers.is_empty() {
        return None;
    }
    let transaction_id = make_transaction_id(entropy);
    let request = make_bind_request(&transaction_id);

    // The starting position and stride come from the same entropy; a
    // stride co-prime with the list length walks every server.
    let mut pos = (entropy as usize) % servers.len();
    let mut step = 1 + ((entropy >> 16) as usize) % servers.len();
    if gcd(step, servers.len()) != 1 {
        step = 1;
    }

    for _ in 0..2 * servers.len() {
        let server = servers[pos].as_ref();
        match transport.exchange(server, &request, EXCHANGE_TIMEOUT) {
            Ok(response) => {
                if let Some(mapped) = parse_bind_response(&response, &transaction_id) {
                    log::info!("STUN server {server} reports external address {mapped}");
                    return Some((mapped, pos));
                }
                log::debug!("STUN server {server} sent an unusable response");
            }
            Err(e) => log::debug!("STUN exchange with {server} failed: {e}"),
        }
        pos = (pos + step) % servers.len();
    }
    None
}

fn gcd(a: usize, b: usize) -> usize {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}
