//! Ordered decision rules applied to each resolved scan. Pure: the
//! policy inspects session facts and returns a [`ScanDecision`]; all
//! mutation and I/O happens in the engine dispatch.

use crate::resolver::Resolution;
use crate::session::RejectReason;
use tally_protocol::Item;
use tally_protocol::ItemId;

/// Session facts the policy needs for one scan.
#[derive(Debug)]
pub struct PolicyContext<'a> {
    pub current: Option<&'a Item>,
    /// Resolver output for the scanned code.
    pub resolved: Resolution,
    pub attach_first_scan: bool,
    pub auto_select_by_barcode: bool,
    pub auto_switch_on_match: bool,
    /// The attach dedupe key is live for this code (same scan burst).
    pub recently_attached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanDecision {
    Reject(RejectReason),
    /// Switch selection to the matched item. The switch consumes the
    /// scan: neither item's delta changes.
    Switch { to: ItemId },
    /// Auto-select matched a different item but auto-switch is off;
    /// surface a suggestion instead.
    SuggestSwitch { item_id: ItemId },
    /// Attach the code as the current item's barcode, then count the
    /// same scan. Two sequential, independently-failable sub-operations.
    AttachAndCount,
    /// Plain accepted increment for the current item.
    Count,
    /// Attach dedupe burst; drop silently.
    Ignore,
}

pub fn decide(code: &str, ctx: PolicyContext<'_>) -> ScanDecision {
    let Some(current) = ctx.current else {
        return ScanDecision::Reject(RejectReason::NoItemSelected);
    };

    if ctx.auto_select_by_barcode {
        match &ctx.resolved {
            Resolution::Match(item) if item.id != current.id => {
                return if ctx.auto_switch_on_match {
                    ScanDecision::Switch { to: item.id }
                } else {
                    ScanDecision::SuggestSwitch { item_id: item.id }
                };
            }
            Resolution::Match(_) => {}
            Resolution::NotInScope(_) | Resolution::NoMatch => {
                return ScanDecision::Reject(RejectReason::NotInScope {
                    code: code.to_string(),
                });
            }
        }
    }

    match &current.barcode {
        Some(expected) if code != expected => ScanDecision::Reject(RejectReason::Mismatch {
            scanned: code.to_string(),
            expected: expected.clone(),
        }),
        Some(_) => ScanDecision::Count,
        None if ctx.attach_first_scan => {
            if ctx.recently_attached {
                ScanDecision::Ignore
            } else {
                ScanDecision::AttachAndCount
            }
        }
        None => ScanDecision::Count,
    }
}
