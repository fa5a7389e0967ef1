//! Turns commit errors into messages a submitter can act on.

use crate::error::CoreError;

struct KnownSignature {
    needles: &'static [&'static str],
    message: &'static str,
}

const KNOWN_SIGNATURES: [KnownSignature; 4] = [
    KnownSignature {
        needles: &["bucket not found", "bucket does not exist", "no such bucket"],
        message: "File storage is not configured: the upload bucket is missing. \
                  Ask an administrator to create it, then retry.",
    },
    KnownSignature {
        needles: &["row-level security", "row level security", "permission denied"],
        message: "The storage service refused the upload because of its access policy. \
                  Ask an administrator to review storage permissions, then retry.",
    },
    KnownSignature {
        needles: &["payload too large", "entity too large", "exceeded the maximum allowed size"],
        message: "The file is larger than the storage service accepts. \
                  Use a smaller file and retry.",
    },
    KnownSignature {
        needles: &["timed out", "timeout", "network error", "failed to fetch"],
        message: "The service could not be reached. Check your connection and retry.",
    },
];

/// Message shown for a failed commit. Collaborator errors matching a known
/// infrastructure signature are replaced with an actionable explanation;
/// everything else keeps its original wording.
pub fn describe_failure(error: &CoreError) -> String {
    if let Some(raw) = error.backend_message() {
        let lowered = raw.to_lowercase();
        if let Some(known) = KNOWN_SIGNATURES
            .iter()
            .find(|known| known.needles.iter().any(|needle| lowered.contains(needle)))
        {
            return known.message.to_string();
        }
    }
    error.to_string()
}
