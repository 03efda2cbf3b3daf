use serde::{Deserialize, Serialize};

/// Upper bound of the per-user recent-operations ring buffer.
pub const MAX_RECENT_OPS: usize = 20;

/// One entry in a user's recent-operations log, newest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub kind: String,
    pub resource: String,
    pub resource_id: String,
    pub summary: String,
    pub created_at: i64,
}

/// Push `op` to the front and drop anything past [`MAX_RECENT_OPS`].
pub fn push_bounded(ops: &mut Vec<Operation>, op: Operation) {
    ops.insert(0, op);
    ops.truncate(MAX_RECENT_OPS);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(n: usize) -> Operation {
        Operation {
            kind: "like".to_string(),
            resource: "recipe".to_string(),
            resource_id: format!("{n}"),
            summary: format!("op {n}"),
            created_at: n as i64,
        }
    }

    #[test]
    fn newest_first_and_bounded() {
        let mut ops = Vec::new();
        for n in 0..MAX_RECENT_OPS + 5 {
            push_bounded(&mut ops, op(n));
        }
        assert_eq!(ops.len(), MAX_RECENT_OPS);
        assert_eq!(ops[0].resource_id, format!("{}", MAX_RECENT_OPS + 4));
        assert_eq!(ops.last().unwrap().resource_id, "5");
    }
}
