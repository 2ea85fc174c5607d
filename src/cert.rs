use std::collections::HashSet;

use const_oid::{db::rfc4519::CN, AssociatedOid as _, ObjectIdentifier};
use der::{
    asn1::{Ia5StringRef, PrintableStringRef, Utf8StringRef},
    Decode as _, Encode as _, EncodePem as _,
};
use x509_cert::{
    ext::{
        pkix::{name::GeneralName, SubjectAltName},
        Extension,
    },
    request::CertReq,
    Certificate,
};

use crate::error::{Error, Result};

/// PKCS#9 extensionRequest, the CSR attribute carrying X.509 extensions.
const ID_EXTENSION_REQ: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.9.14");

/// A parsed certificate signing request.
#[derive(Debug)]
pub(crate) struct Csr {
    req: CertReq,
}

impl Csr {
    /// Parse a CSR from PEM containing exactly one request block.
    pub(crate) fn from_pem(pem: &str) -> Result<Csr> {
        let mut blocks = Vec::new();

        for item in rustls_pemfile::read_all(&mut pem.as_bytes()) {
            match item.map_err(|err| Error::BadCsr(format!("unreadable PEM: {err}")))? {
                rustls_pemfile::Item::Csr(der) => blocks.push(der),
                _ => return Err(Error::BadCsr("PEM block is not a CSR".to_owned())),
            }
        }

        if blocks.len() != 1 {
            return Err(Error::BadCsr(format!(
                "expected exactly one CSR, found {}",
                blocks.len(),
            )));
        }

        let req = CertReq::from_der(blocks[0].as_ref())
            .map_err(|err| Error::BadCsr(err.to_string()))?;

        Ok(Csr { req })
    }

    pub(crate) fn to_der(&self) -> Result<Vec<u8>> {
        self.req.to_der().map_err(|err| Error::BadCsr(err.to_string()))
    }

    /// The domains this CSR names: subject CN first, then SAN dNSNames, in
    /// declaration order with duplicates removed.
    ///
    /// Each of these must pass its own authorization before issuance.
    pub(crate) fn domains(&self) -> Result<Vec<String>> {
        let mut domains = Vec::new();
        let mut dedup = HashSet::new();

        for rdn in self.req.info.subject.0.iter() {
            for atv in rdn.0.iter() {
                if atv.oid != CN {
                    continue;
                }

                if let Some(cn) = directory_string(&atv.value) {
                    if dedup.insert(cn.clone()) {
                        domains.push(cn);
                    }
                }
            }
        }

        for name in self.san_dns_names()? {
            if dedup.insert(name.clone()) {
                domains.push(name);
            }
        }

        if domains.is_empty() {
            return Err(Error::BadCsr(
                "CSR names no subject CN and no SAN dNSName".to_owned(),
            ));
        }

        Ok(domains)
    }

    /// dNSName entries of the subjectAltName extension, when the CSR carries
    /// an extensionRequest attribute.
    fn san_dns_names(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();

        for attr in self.req.info.attributes.iter() {
            if attr.oid != ID_EXTENSION_REQ {
                continue;
            }

            for value in attr.values.iter() {
                let extensions = value
                    .decode_as::<Vec<Extension>>()
                    .map_err(|err| Error::BadCsr(err.to_string()))?;

                for ext in extensions {
                    if ext.extn_id != SubjectAltName::OID {
                        continue;
                    }

                    let san = SubjectAltName::from_der(ext.extn_value.as_bytes())
                        .map_err(|err| Error::BadCsr(err.to_string()))?;

                    names.extend(san.0.iter().filter_map(|name| match name {
                        GeneralName::DnsName(dns) => Some(dns.to_string()),
                        _ => None,
                    }));
                }
            }
        }

        Ok(names)
    }
}

/// Decode a DirectoryString-ish attribute value (UTF8, Printable, or IA5).
fn directory_string(value: &der::Any) -> Option<String> {
    if let Ok(s) = value.decode_as::<Utf8StringRef<'_>>() {
        return Some(s.to_string());
    }
    if let Ok(s) = value.decode_as::<PrintableStringRef<'_>>() {
        return Some(s.to_string());
    }
    if let Ok(s) = value.decode_as::<Ia5StringRef<'_>>() {
        return Some(s.to_string());
    }
    None
}

/// Validate a DER certificate and wrap it in a single PEM `CERTIFICATE`
/// block.
pub(crate) fn pem_from_der(der: &[u8]) -> Result<String> {
    let cert = Certificate::from_der(der).map_err(|err| Error::BadCert(err.to_string()))?;

    cert.to_pem(der::pem::LineEnding::LF)
        .map_err(|err| Error::BadCert(err.to_string()))
}
