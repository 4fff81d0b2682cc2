use uuid::Uuid;

/// What a `receive` address refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceiveTarget {
    /// A plain HTTP download.
    Http(String),
    /// A peer-to-peer transfer, optionally with the sender's offer attached.
    Transfer {
        file_id: String,
        offer: Option<String>,
    },
}

/// A fresh transfer id: 16 lowercase hex characters.
pub fn generate_file_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(16);
    id
}

/// Decides how to treat a user-supplied receive address.
///
/// `<file_id>|<offer>` is always a transfer. Otherwise: an explicit
/// `http://` or `https://` URL is HTTP; any other `scheme://` is a transfer
/// id; 16 hex characters are a transfer id; anything containing `/` or `.`
/// is taken as an HTTP host or path; everything else is a transfer id.
pub fn classify_address(address: &str) -> ReceiveTarget {
    let address = address.trim();

    if let Some((file_id, offer)) = address.split_once('|') {
        let offer = offer.trim();
        return ReceiveTarget::Transfer {
            file_id: file_id.trim().to_owned(),
            offer: (!offer.is_empty()).then(|| offer.to_owned()),
        };
    }

    let lower = address.to_ascii_lowercase();
    let is_http = if lower.starts_with("http://") || lower.starts_with("https://") {
        true
    } else if address.contains("://") {
        false
    } else if is_file_id(address) {
        false
    } else {
        address.contains('/') || address.contains('.')
    };

    if is_http {
        ReceiveTarget::Http(address.to_owned())
    } else {
        ReceiveTarget::Transfer {
            file_id: address.to_owned(),
            offer: None,
        }
    }
}

fn is_file_id(s: &str) -> bool {
    s.len() == 16 && s.chars().all(|c| c.is_ascii_hexdigit())
}
