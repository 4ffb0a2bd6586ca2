use futures::{stream, StreamExt};

use crate::{
    domain::peer::PeerRef,
    usecases::{context::RunContext, contracts::DialogSource},
};

/// Resolves every peer to a display name. Output is index-aligned with
/// `peers`; a peer that fails to resolve gets its placeholder name instead of
/// failing the batch.
pub async fn resolve_names(
    ctx: &RunContext,
    source: &dyn DialogSource,
    peers: &[PeerRef],
) -> Vec<String> {
    if peers.is_empty() {
        return Vec::new();
    }

    stream::iter(peers.iter().copied())
        .map(|peer| async move {
            match source.get_entity(peer).await {
                Ok(entity) => entity.display_name(),
                Err(error) => {
                    ctx.record_unresolved(peer, &error);
                    peer.placeholder_name()
                }
            }
        })
        .buffered(ctx.resolve_concurrency())
        .collect()
        .await
}
