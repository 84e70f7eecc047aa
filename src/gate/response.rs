//! HTTP-facing shape of a gate rejection.

// self
use crate::_prelude::*;

/// Details attached to [`Admission::Deny`](crate::gate::Admission::Deny).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rejection {
	/// Whole seconds until the current window resets, rounded up.
	pub retry_after_secs: u64,
}
impl Rejection {
	/// Status code callers must answer a rejected HTTP request with.
	pub const STATUS_CODE: u16 = 429;

	/// Creates a rejection advising a retry after `retry_after_secs`.
	pub const fn new(retry_after_secs: u64) -> Self {
		Self { retry_after_secs }
	}

	/// Builds the JSON body existing clients expect alongside a 429.
	pub fn body(&self) -> RejectionBody {
		RejectionBody { error: RejectionBody::ERROR.into(), retry_after: self.retry_after_secs }
	}

	/// Serializes [`Rejection::body`] to a JSON string.
	pub fn to_json(&self) -> Result<String> {
		Ok(serde_json::to_string(&self.body())?)
	}
}

/// Wire body of a rate-limited response: `{"error":"Too Many Requests","retryAfter":n}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectionBody {
	/// Always `"Too Many Requests"`.
	pub error: String,
	/// Seconds until the client may retry.
	pub retry_after: u64,
}
impl RejectionBody {
	/// Error label carried by every rejection body.
	pub const ERROR: &'static str = "Too Many Requests";
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn body_matches_client_contract() {
		let json = Rejection::new(7).to_json().expect("Rejection body should serialize.");

		assert_eq!(json, r#"{"error":"Too Many Requests","retryAfter":7}"#);
		assert_eq!(Rejection::STATUS_CODE, 429);
	}

	#[test]
	fn body_deserializes_from_client_payload() {
		let body: RejectionBody =
			serde_json::from_str(r#"{"error":"Too Many Requests","retryAfter":3}"#)
				.expect("Client payload should deserialize.");

		assert_eq!(body, Rejection::new(3).body());
	}
}
