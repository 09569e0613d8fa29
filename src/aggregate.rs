use crate::types::{ChannelId, GroupSummary, JoinedRecord, Month};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct Aggregated {
    /// One entry per (Producer, Month, Channel), in key order.
    pub groups: Vec<GroupSummary>,
    /// Joined rows with no Month or no Channel; they belong to no group.
    pub ungrouped_rows: usize,
}

fn nulls_last<T: Ord>(a: &Option<T>, b: &Option<T>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.cmp(y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Ascending (Producer, Month, Channel, Date), nulls last.
fn sort_order(a: &JoinedRecord, b: &JoinedRecord) -> Ordering {
    a.producer
        .cmp(&b.producer)
        .then_with(|| nulls_last(&a.viewing.month, &b.viewing.month))
        .then_with(|| nulls_last(&a.viewing.channel, &b.viewing.channel))
        .then_with(|| nulls_last(&a.viewing.date, &b.viewing.date))
}

/// Group joined rows by (Producer, Month, Channel).
///
/// Peak, sum and cumulative totals all come out of a single pass over the
/// rows in sort order, so every group has all four values by construction.
/// The running total is kept per producer and is never reset at month or
/// channel boundaries; rows without a group key still add to it at their
/// sorted position (after the producer's dated rows).
pub fn aggregate(mut joined: Vec<JoinedRecord>) -> Aggregated {
    struct Acc {
        top_programme: String,
        top_row: usize,
        highest: f64,
        sum: f64,
        cumulative: f64,
    }

    impl Acc {
        fn start(r: &JoinedRecord, running: f64) -> Self {
            Acc {
                top_programme: r.viewing.programme.clone(),
                top_row: r.row,
                highest: r.viewing.viewers,
                sum: r.viewing.viewers,
                cumulative: running,
            }
        }

        fn absorb(&mut self, r: &JoinedRecord, running: f64) {
            let v = r.viewing.viewers;
            // Rows arrive in date order, so compare positions for the tie-break.
            if v > self.highest || (v == self.highest && r.row < self.top_row) {
                self.highest = v;
                self.top_row = r.row;
                self.top_programme = r.viewing.programme.clone();
            }
            self.sum += v;
            self.cumulative = self.cumulative.max(running);
        }
    }

    joined.sort_by(sort_order);

    let mut map: BTreeMap<(String, Month, ChannelId), Acc> = BTreeMap::new();
    let mut ungrouped_rows = 0usize;
    let mut producer: Option<&str> = None;
    let mut running = 0.0;
    for r in &joined {
        if producer != Some(r.producer.as_str()) {
            producer = Some(r.producer.as_str());
            running = 0.0;
        }
        running += r.viewing.viewers;

        let (Some(month), Some(channel)) = (r.viewing.month, r.viewing.channel.as_ref()) else {
            ungrouped_rows += 1;
            continue;
        };
        map.entry((r.producer.clone(), month, channel.clone()))
            .and_modify(|acc| acc.absorb(r, running))
            .or_insert_with(|| Acc::start(r, running));
    }

    if ungrouped_rows > 0 {
        debug!(rows = ungrouped_rows, "rows without a month or channel left out of the summary");
    }

    let groups: Vec<GroupSummary> = map
        .into_iter()
        .map(|((producer, month, channel), acc)| GroupSummary {
            producer,
            month,
            channel,
            top_programme: acc.top_programme,
            highest_viewers: acc.highest,
            sum_of_viewers: acc.sum,
            cumulative_viewers: acc.cumulative,
        })
        .collect();
    info!(groups = groups.len(), "aggregated viewing data");
    Aggregated {
        groups,
        ungrouped_rows,
    }
}
