use log::{debug, warn};

use crate::attribute::message_integrity::{self, IntegrityResult};
use crate::attribute::{self, Attribute, ErrorCode, Fingerprint, MessageIntegrity, Tlv};
use crate::error::Error;
use crate::header::{Class, Header, Method, TransactionId, HEADER_LEN};

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub header: Header,
    pub attributes: Vec<Attribute>,
}

impl Message {
    pub fn new(class: Class, method: Method, transaction_id: TransactionId) -> Self {
        Self {
            header: Header::new(class, method, transaction_id),
            attributes: vec![],
        }
    }

    pub fn and_attribute(mut self, attribute: Attribute) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.header.transaction_id
    }

    pub fn get_attribute(&self, typ: u16) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.typ() == typ)
    }

    fn encode_attribute(&self, attribute: &Attribute) -> Vec<u8> {
        if let Attribute::XorMappedAddress(addr) = attribute {
            let value = addr.encode_with_transaction_id(&self.header.transaction_id);
            let mut bytes = Vec::with_capacity(4 + value.len() + 3);
            bytes.extend_from_slice(&attribute.typ().to_be_bytes());
            bytes.extend_from_slice(&(value.len() as u16).to_be_bytes());
            bytes.extend_from_slice(&value);
            let pad = (4 - (bytes.len() % 4)) % 4;
            bytes.resize(bytes.len() + pad, 0);
            bytes
        } else {
            attribute.to_bytes()
        }
    }

    fn attributes_len(&self) -> u16 {
        self.attributes
            .iter()
            .map(|a| self.encode_attribute(a).len() as u16)
            .sum()
    }

    /// Encode with the header length field covering every attribute
    /// currently attached.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut header = self.header.clone();
        header.length = self.attributes_len();

        let mut bytes = header.encode().to_vec();
        for attribute in &self.attributes {
            bytes.extend(self.encode_attribute(attribute));
        }
        bytes
    }

    pub fn decode(input: &[u8]) -> Result<Self, Error> {
        let header = Header::decode(input)?;
        let body_end = HEADER_LEN + header.length as usize;
        if input.len() < body_end {
            debug!(
                "STUN message body shorter than header length field: expected {}, got {}",
                body_end,
                input.len()
            );
            return Err(Error::InsufficientData {
                expected: body_end,
                actual: input.len(),
            });
        }
        let attributes = attribute::decode_all(&input[HEADER_LEN..body_end], &header.transaction_id)
            .map_err(|err| {
                debug!("failed to decode STUN message attributes: {}", err);
                err
            })?;

        Ok(Self { header, attributes })
    }

    /// Append MESSAGE-INTEGRITY, first setting the header length as though
    /// the attribute were already present (RFC 5389 §15.4).
    pub fn with_message_integrity(self, key: &[u8]) -> Self {
        let prior_len = self.attributes_len();
        let mut header = self.header.clone();
        header.length = prior_len + 4 + message_integrity::LEN as u16;

        let mut signed_region = header.encode().to_vec();
        for attribute in &self.attributes {
            signed_region.extend(self.encode_attribute(attribute));
        }

        let integrity = MessageIntegrity::compute(&signed_region, key);
        self.and_attribute(Attribute::MessageIntegrity(integrity))
    }

    /// Append FINGERPRINT last, after the header length includes it.
    pub fn with_fingerprint(self) -> Self {
        let prior_len = self.attributes_len();
        let mut header = self.header.clone();
        header.length = prior_len + 4 + 4;

        let mut signed_region = header.encode().to_vec();
        for attribute in &self.attributes {
            signed_region.extend(self.encode_attribute(attribute));
        }

        let fingerprint = Fingerprint::compute(&signed_region);
        self.and_attribute(Attribute::Fingerprint(fingerprint))
    }

    /// Verify MESSAGE-INTEGRITY against the bytes preceding it, reproducing
    /// the length adjustment the encoder applied.
    pub fn verify_integrity(&self, key: &[u8]) -> IntegrityResult {
        let integrity_index = self
            .attributes
            .iter()
            .position(|a| matches!(a, Attribute::MessageIntegrity(_)));
        let Some(integrity_index) = integrity_index else {
            return IntegrityResult::Missing;
        };
        let Attribute::MessageIntegrity(integrity) = &self.attributes[integrity_index] else {
            unreachable!()
        };

        let prefix_len: u16 = self.attributes[..integrity_index]
            .iter()
            .map(|a| self.encode_attribute(a).len() as u16)
            .sum();

        let mut header = self.header.clone();
        header.length = prefix_len + 4 + message_integrity::LEN as u16;

        let mut signed_region = header.encode().to_vec();
        for attribute in &self.attributes[..integrity_index] {
            signed_region.extend(self.encode_attribute(attribute));
        }

        if integrity.verify(&signed_region, key) {
            IntegrityResult::Valid
        } else {
            warn!("STUN MESSAGE-INTEGRITY verification failed");
            IntegrityResult::Invalid
        }
    }

    /// Verify FINGERPRINT, if present.
    pub fn verify_fingerprint(&self) -> Option<bool> {
        let fp_index = self
            .attributes
            .iter()
            .position(|a| matches!(a, Attribute::Fingerprint(_)))?;
        let Attribute::Fingerprint(fingerprint) = &self.attributes[fp_index] else {
            unreachable!()
        };

        let prefix_len: u16 = self.attributes[..fp_index]
            .iter()
            .map(|a| self.encode_attribute(a).len() as u16)
            .sum();

        let mut header = self.header.clone();
        header.length = prefix_len + 4 + 4;

        let mut signed_region = header.encode().to_vec();
        for attribute in &self.attributes[..fp_index] {
            signed_region.extend(self.encode_attribute(attribute));
        }

        let valid = fingerprint.verify(&signed_region);
        if !valid {
            warn!("STUN FINGERPRINT verification failed");
        }
        Some(valid)
    }

    /// Build a STUN error response with the given code/reason, signed with
    /// MESSAGE-INTEGRITY and terminated with FINGERPRINT, matching the
    /// request's transaction id.
    pub fn error_response(
        request: &Message,
        numeric_code: crate::attribute::error_code::NumericCode,
        reason: &str,
        key: &[u8],
    ) -> Self {
        Message::new(Class::Error, request.header.method, *request.transaction_id())
            .and_attribute(Attribute::ErrorCode(ErrorCode::new(numeric_code, reason)))
            .with_message_integrity(key)
            .with_fingerprint()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::Username;

    #[test]
    fn header_round_trip() {
        let message = Message::new(Class::Request, Method::Binding, [0; 12]);
        let bytes = message.to_bytes();
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded.header.class, Class::Request);
        assert_eq!(decoded.attributes.len(), 0);
    }

    #[test]
    fn message_integrity_and_fingerprint() {
        let key = b"password123456789012";
        let message = Message::new(Class::Request, Method::Binding, [1; 12])
            .and_attribute(Attribute::Username(Username::new("remote:local")))
            .and_attribute(Attribute::IceControlling(
                crate::attribute::IceControlling(12345),
            ))
            .with_message_integrity(key)
            .with_fingerprint();

        assert_eq!(message.verify_integrity(key), IntegrityResult::Valid);
        assert_eq!(message.verify_fingerprint(), Some(true));

        let bytes = message.to_bytes();
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded.attributes.len(), 4);
        assert_eq!(decoded.verify_integrity(key), IntegrityResult::Valid);
        assert_eq!(decoded.verify_fingerprint(), Some(true));
    }

    #[test]
    fn tampering_invalidates_integrity() {
        let key = b"password123456789012";
        let message = Message::new(Class::Request, Method::Binding, [2; 12])
            .and_attribute(Attribute::Username(Username::new("remote:local")))
            .with_message_integrity(key);

        let mut bytes = message.to_bytes();
        bytes[8] ^= 0xFF;
        let decoded = Message::decode(&bytes).unwrap();
        assert_eq!(decoded.verify_integrity(key), IntegrityResult::Invalid);
    }

    #[test]
    fn missing_integrity_is_distinguished() {
        let message = Message::new(Class::Request, Method::Binding, [3; 12]);
        assert_eq!(message.verify_integrity(b"key"), IntegrityResult::Missing);
    }
}
