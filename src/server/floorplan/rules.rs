use derive_more::Display;

use crate::server::model::table::Table;

/// A booking that would leave this many seats (or more) unused is turned
/// down so large tables stay free for large parties.
pub(crate) const CAPACITY_SLACK: i16 = 3;

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Verdict {
    Accept,
    Reject(RejectReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Display)]
pub(crate) enum RejectReason {
    #[display("party too large for this table")]
    PartyTooLarge,
    #[display("table too large for this party")]
    TableTooLarge,
}

/// Advisory check of a requested party size against one table. Callers are
/// expected to re-prompt on rejection, not fail.
pub(crate) fn evaluate(table: &Table, party_size: i16) -> Verdict {
    if party_size > table.capacity {
        return Verdict::Reject(RejectReason::PartyTooLarge);
    }
    if table.capacity - party_size >= CAPACITY_SLACK {
        return Verdict::Reject(RejectReason::TableTooLarge);
    }
    Verdict::Accept
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::model::table::Position;

    fn table(capacity: i16) -> Table {
        Table {
            id: 1,
            restaurant_id: 1,
            position: Position { x: 0.0, y: 0.0 },
            capacity,
            is_available: true,
            created_by: 7,
        }
    }

    #[test]
    fn party_larger_than_capacity_is_rejected() {
        assert_eq!(
            evaluate(&table(4), 5),
            Verdict::Reject(RejectReason::PartyTooLarge)
        );
    }

    #[test]
    fn small_party_on_large_table_is_rejected() {
        assert_eq!(
            evaluate(&table(8), 2),
            Verdict::Reject(RejectReason::TableTooLarge)
        );
    }

    #[test]
    fn close_fits_are_accepted() {
        assert_eq!(evaluate(&table(4), 3), Verdict::Accept);
        assert_eq!(evaluate(&table(4), 4), Verdict::Accept);
    }

    #[test]
    fn slack_boundary_sits_at_three_spare_seats() {
        assert_eq!(
            evaluate(&table(5), 2),
            Verdict::Reject(RejectReason::TableTooLarge)
        );
        assert_eq!(evaluate(&table(5), 3), Verdict::Accept);
    }
}
