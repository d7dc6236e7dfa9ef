use peerpost_core::domain::post::PostRecord;
use peerpost_core::kudos::apply_hashtag_hook;

/// Runs before a post is stored. Recognition posts get their `hashtags` prop copied into the
/// searchable hashtag field; every other post passes through untouched.
pub fn message_will_be_posted(mut post: PostRecord) -> PostRecord {
    if apply_hashtag_hook(&mut post) {
        tracing::debug!(
            event_name = "hook.hashtags_copied",
            channel_id = %post.channel_id,
            hashtags = %post.hashtags,
            "copied recognition hashtags"
        );
    }
    post
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Map};

    use peerpost_core::domain::channel::ChannelId;
    use peerpost_core::domain::post::{PostId, PostRecord, HASHTAGS_PROP, RECOGNITION_POST_KIND};
    use peerpost_core::domain::user::UserId;

    use super::message_will_be_posted;

    fn post(kind: &str, hashtags: serde_json::Value) -> PostRecord {
        let mut props = Map::new();
        props.insert(HASHTAGS_PROP.to_owned(), hashtags);
        PostRecord {
            id: PostId("p1".to_owned()),
            channel_id: ChannelId("c1".to_owned()),
            user_id: UserId("bot".to_owned()),
            kind: kind.to_owned(),
            message: String::new(),
            props,
            hashtags: String::new(),
            has_reactions: false,
            create_at: 0,
            delete_at: 0,
        }
    }

    #[test]
    fn recognition_posts_gain_hashtags() {
        let hooked = message_will_be_posted(post(RECOGNITION_POST_KIND, json!("#x #y")));
        assert_eq!(hooked.hashtags, "#x #y");
    }

    #[test]
    fn other_posts_are_unchanged() {
        let original = post("", json!("#x"));
        assert_eq!(message_will_be_posted(original.clone()), original);

        let non_string = post(RECOGNITION_POST_KIND, json!(["#x"]));
        assert_eq!(message_will_be_posted(non_string.clone()), non_string);
    }
}
