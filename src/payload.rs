// Payload construction from validated input

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which input form produced a payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadKind {
    Url,
    Text,
    Wifi,
    Vcard,
    Payment,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::Url => "url",
            PayloadKind::Text => "text",
            PayloadKind::Wifi => "wifi",
            PayloadKind::Vcard => "vcard",
            PayloadKind::Payment => "payment",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WifiEncryption {
    #[default]
    Wpa,
    Wep,
    NoPass,
}

impl WifiEncryption {
    fn as_str(self) -> &'static str {
        match self {
            WifiEncryption::Wpa => "WPA",
            WifiEncryption::Wep => "WEP",
            WifiEncryption::NoPass => "nopass",
        }
    }
}

impl FromStr for WifiEncryption {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wpa" | "wpa2" => Ok(WifiEncryption::Wpa),
            "wep" => Ok(WifiEncryption::Wep),
            "nopass" | "none" => Ok(WifiEncryption::NoPass),
            other => Err(format!("unknown encryption '{}' (expected WPA, WEP or nopass)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaymentMethod {
    #[default]
    Bitcoin,
    Ethereum,
    Paypal,
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bitcoin" | "btc" => Ok(PaymentMethod::Bitcoin),
            "ethereum" | "eth" => Ok(PaymentMethod::Ethereum),
            "paypal" => Ok(PaymentMethod::Paypal),
            other => Err(format!(
                "unknown payment method '{}' (expected bitcoin, ethereum or paypal)",
                other
            )),
        }
    }
}

/// Raw form input for one generation request. Fields are trimmed when
/// the payload is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadRequest {
    Url {
        url: String,
    },
    Text {
        text: String,
    },
    Wifi {
        ssid: String,
        password: String,
        encryption: WifiEncryption,
    },
    Vcard {
        name: String,
        phone: String,
        email: String,
        org: String,
    },
    Payment {
        method: PaymentMethod,
        address: String,
        amount: String,
    },
}

impl PayloadRequest {
    pub fn kind(&self) -> PayloadKind {
        match self {
            PayloadRequest::Url { .. } => PayloadKind::Url,
            PayloadRequest::Text { .. } => PayloadKind::Text,
            PayloadRequest::Wifi { .. } => PayloadKind::Wifi,
            PayloadRequest::Vcard { .. } => PayloadKind::Vcard,
            PayloadRequest::Payment { .. } => PayloadKind::Payment,
        }
    }

    /// Validate the input and build the string to encode
    pub fn build(&self) -> Result<String> {
        match self {
            PayloadRequest::Url { url } => {
                let url = required(url, "Please enter a URL")?;
                if has_http_scheme(url) {
                    Ok(url.to_string())
                } else {
                    Ok(format!("https://{}", url))
                }
            }
            PayloadRequest::Text { text } => Ok(required(text, "Please enter text")?.to_string()),
            PayloadRequest::Wifi {
                ssid,
                password,
                encryption,
            } => {
                let ssid = required(ssid, "Please enter WiFi SSID")?;
                Ok(format!(
                    "WIFI:T:{};S:{};P:{};;",
                    encryption.as_str(),
                    ssid,
                    password.trim()
                ))
            }
            PayloadRequest::Vcard {
                name,
                phone,
                email,
                org,
            } => {
                let name = required(name, "Please enter a name")?;
                Ok(format!(
                    "BEGIN:VCARD\nVERSION:3.0\nFN:{}\nTEL:{}\nEMAIL:{}\nORG:{}\nEND:VCARD",
                    name,
                    phone.trim(),
                    email.trim(),
                    org.trim()
                ))
            }
            PayloadRequest::Payment {
                method,
                address,
                amount,
            } => {
                let address = required(address, "Please enter payment address")?;
                let amount = amount.trim();
                let payload = match (method, amount.is_empty()) {
                    (PaymentMethod::Bitcoin, true) => format!("bitcoin:{}", address),
                    (PaymentMethod::Bitcoin, false) => {
                        format!("bitcoin:{}?amount={}", address, amount)
                    }
                    (PaymentMethod::Ethereum, true) => format!("ethereum:{}", address),
                    (PaymentMethod::Ethereum, false) => {
                        format!("ethereum:{}?value={}", address, amount)
                    }
                    (PaymentMethod::Paypal, true) => format!("https://paypal.me/{}", address),
                    (PaymentMethod::Paypal, false) => {
                        format!("https://paypal.me/{}/{}", address, amount)
                    }
                };
                Ok(payload)
            }
        }
    }
}

fn required<'a>(value: &'a str, message: &str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::Validation(message.to_string()));
    }
    Ok(value)
}

/// `http://` or `https://` prefix, matched case-sensitively
fn has_http_scheme(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validation_message(result: Result<String>) -> String {
        match result {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_url_gets_https_prefix() {
        let request = PayloadRequest::Url {
            url: "example.com".to_string(),
        };
        assert_eq!(request.build().unwrap(), "https://example.com");
    }

    #[test]
    fn test_url_keeps_existing_scheme() {
        for url in ["http://example.com", "https://example.com/path"] {
            let request = PayloadRequest::Url { url: format!("  {} ", url) };
            assert_eq!(request.build().unwrap(), url);
        }
    }

    #[test]
    fn test_url_other_scheme_is_prefixed() {
        let request = PayloadRequest::Url {
            url: "ftp://example.com".to_string(),
        };
        assert_eq!(request.build().unwrap(), "https://ftp://example.com");
    }

    #[test]
    fn test_empty_inputs_are_rejected() {
        assert_eq!(
            validation_message(PayloadRequest::Url { url: "   ".to_string() }.build()),
            "Please enter a URL"
        );
        assert_eq!(
            validation_message(PayloadRequest::Text { text: String::new() }.build()),
            "Please enter text"
        );
    }

    #[test]
    fn test_wifi_payload() {
        let request = PayloadRequest::Wifi {
            ssid: "Home".to_string(),
            password: "secret".to_string(),
            encryption: WifiEncryption::Wpa,
        };
        assert_eq!(request.build().unwrap(), "WIFI:T:WPA;S:Home;P:secret;;");
        assert_eq!(request.kind(), PayloadKind::Wifi);
    }

    #[test]
    fn test_wifi_requires_ssid() {
        let request = PayloadRequest::Wifi {
            ssid: " ".to_string(),
            password: "secret".to_string(),
            encryption: WifiEncryption::NoPass,
        };
        assert_eq!(validation_message(request.build()), "Please enter WiFi SSID");
    }

    #[test]
    fn test_vcard_payload() {
        let request = PayloadRequest::Vcard {
            name: "Ada Lovelace".to_string(),
            phone: "+44 20 1234".to_string(),
            email: "ada@example.com".to_string(),
            org: String::new(),
        };
        assert_eq!(
            request.build().unwrap(),
            "BEGIN:VCARD\nVERSION:3.0\nFN:Ada Lovelace\nTEL:+44 20 1234\n\
             EMAIL:ada@example.com\nORG:\nEND:VCARD"
        );
    }

    #[test]
    fn test_payment_payloads() {
        let build = |method, amount: &str| {
            PayloadRequest::Payment {
                method,
                address: "addr1".to_string(),
                amount: amount.to_string(),
            }
            .build()
            .unwrap()
        };
        assert_eq!(build(PaymentMethod::Bitcoin, ""), "bitcoin:addr1");
        assert_eq!(build(PaymentMethod::Bitcoin, "0.5"), "bitcoin:addr1?amount=0.5");
        assert_eq!(build(PaymentMethod::Ethereum, "2"), "ethereum:addr1?value=2");
        assert_eq!(build(PaymentMethod::Paypal, ""), "https://paypal.me/addr1");
        assert_eq!(build(PaymentMethod::Paypal, "10"), "https://paypal.me/addr1/10");
    }

    #[test]
    fn test_payment_requires_address() {
        let request = PayloadRequest::Payment {
            method: PaymentMethod::Paypal,
            address: String::new(),
            amount: "5".to_string(),
        };
        assert_eq!(validation_message(request.build()), "Please enter payment address");
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("WPA".parse::<WifiEncryption>(), Ok(WifiEncryption::Wpa));
        assert_eq!("nopass".parse::<WifiEncryption>(), Ok(WifiEncryption::NoPass));
        assert_eq!("eth".parse::<PaymentMethod>(), Ok(PaymentMethod::Ethereum));
        assert!("cash".parse::<PaymentMethod>().is_err());
    }
}
