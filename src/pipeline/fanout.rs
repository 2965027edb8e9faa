use tracing::{debug, warn};

use super::{GroupDirectory, MessagePipeline, NotificationSender};
use crate::kafka::types::Notification;
use crate::message::Message;
use crate::metrics;

/// Emit one notification per group member except the sender.
///
/// Returns the number of notifications that were sent. Send failures do not
/// stop the iteration.
pub(super) async fn fan_out(
    directory: &dyn GroupDirectory,
    notifier: &dyn NotificationSender,
    sender_id: i64,
    group_id: i64,
    content: &str,
) -> usize {
    let members = match directory.member_ids(group_id).await {
        Ok(members) => members,
        Err(e) => {
            warn!(error = %e, group_id = group_id, "Failed to read group roster, skipping fan-out");
            return 0;
        }
    };

    let mut sent = 0;
    for member_id in members.into_iter().filter(|id| *id != sender_id) {
        let notification = Notification {
            from_user_id: sender_id,
            to_user_id: member_id,
            room_id: group_id,
            content: content.to_string(),
        };

        match notifier.send(&notification).await {
            Ok(()) => {
                metrics::NOTIFICATIONS_SENT_TOTAL.inc();
                sent += 1;
            }
            Err(e) => {
                metrics::NOTIFICATIONS_FAILED_TOTAL.inc();
                warn!(
                    error = %e,
                    group_id = group_id,
                    recipient = member_id,
                    "Failed to send notification"
                );
            }
        }
    }

    debug!(group_id = group_id, sent = sent, "Fan-out finished");
    sent
}

impl MessagePipeline {
    pub(super) fn spawn_fanout(&self, message: &Message) {
        let directory = self.deps.directory.clone();
        let notifier = self.deps.notifier.clone();
        let sender_id = message.user_id;
        let group_id = message.group_id;
        let content = message.content.clone();

        self.tasks.spawn(async move {
            fan_out(
                directory.as_ref(),
                notifier.as_ref(),
                sender_id,
                group_id,
                &content,
            )
            .await;
        });
    }
}
