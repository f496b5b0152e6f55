// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! TweetDetail GraphQL query

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::Helicon;
use crate::error::Result;

/// GraphQL query id of the TweetDetail operation
pub const QUERY_ID: &str = "1RFzrZSUoVSgHzVK4MHWlg";

/// Feature flags the web client sends with TweetDetail, all enabled
pub const DEFAULT_FEATURES: &[&str] = &[
    "rweb_video_screen_enabled",
    "profile_label_improvements_pcf_label_in_post_enabled",
    "rweb_tipjar_consumption_enabled",
    "verified_phone_label_enabled",
    "creator_subscriptions_tweet_preview_api_enabled",
    "responsive_web_graphql_timeline_navigation_enabled",
    "responsive_web_graphql_skip_user_profile_image_extensions_enabled",
    "premium_content_api_read_enabled",
    "communities_web_enable_tweet_community_results_fetch",
    "c9s_tweet_anatomy_moderator_badge_enabled",
    "responsive_web_grok_analyze_button_fetch_trends_enabled",
    "responsive_web_grok_analyze_post_followups_enabled",
    "responsive_web_jetfuel_frame",
    "responsive_web_grok_share_attachment_enabled",
    "articles_preview_enabled",
    "responsive_web_edit_tweet_api_enabled",
    "graphql_is_translatable_rweb_tweet_is_translatable_enabled",
    "view_counts_everywhere_api_enabled",
    "longform_notetweets_consumption_enabled",
    "responsive_web_twitter_article_tweet_consumption_enabled",
    "tweet_awards_web_tipping_enabled",
    "responsive_web_grok_show_grok_translated_post",
    "responsive_web_grok_analysis_button_from_backend",
    "creator_subscriptions_quote_tweet_preview_enabled",
    "freedom_of_speech_not_reach_fetch_enabled",
    "standardized_nudges_misinfo",
    "tweet_with_visibility_results_prefer_gql_limited_actions_policy_enabled",
    "longform_notetweets_rich_text_read_enabled",
    "longform_notetweets_inline_media_enabled",
    "responsive_web_grok_image_annotation_enabled",
    "responsive_web_enhance_cards_enabled",
];

/// Query variables
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDetailVariables {
    /// Tweet whose conversation is requested
    pub focal_tweet_id: String,
    /// Page the tweet was opened from, e.g. `home`
    #[serde(skip_serializing_if = "String::is_empty")]
    pub referrer: String,
    #[serde(rename = "controller_data", skip_serializing_if = "String::is_empty")]
    pub controller_data: String,
    #[serde(rename = "with_rux_injections")]
    pub with_rux_injections: bool,
    /// Reply ordering: `Relevance`, `Recency` or `Likes`
    pub ranking_mode: String,
    pub include_promoted_content: bool,
    pub with_community: bool,
    pub with_quick_promote_eligibility_tweet_fields: bool,
    /// Include Community Notes
    pub with_birdwatch_notes: bool,
    pub with_voice: bool,
}

impl TweetDetailVariables {
    /// Variables the web client sends for a tweet
    pub fn new(tweet_id: impl Into<String>) -> Self {
        Self {
            focal_tweet_id: tweet_id.into(),
            referrer: String::new(),
            controller_data: String::new(),
            with_rux_injections: false,
            ranking_mode: "Relevance".to_string(),
            include_promoted_content: true,
            with_community: true,
            with_quick_promote_eligibility_tweet_fields: true,
            with_birdwatch_notes: true,
            with_voice: true,
        }
    }
}

/// Field toggles
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetDetailFieldToggles {
    pub with_article_rich_content_state: bool,
    pub with_article_plain_text: bool,
    pub with_grok_analyze: bool,
    pub with_disallowed_reply_controls: bool,
}

impl Default for TweetDetailFieldToggles {
    fn default() -> Self {
        Self {
            with_article_rich_content_state: true,
            with_article_plain_text: false,
            with_grok_analyze: false,
            with_disallowed_reply_controls: false,
        }
    }
}

/// A TweetDetail request
#[derive(Debug, Clone)]
pub struct TweetDetailRequest {
    pub variables: TweetDetailVariables,
    /// Feature flag name to value
    pub features: Map<String, Value>,
    pub field_toggles: TweetDetailFieldToggles,
}

impl TweetDetailRequest {
    /// Request with the web client's defaults
    pub fn new(tweet_id: impl Into<String>) -> Self {
        let features = DEFAULT_FEATURES
            .iter()
            .map(|name| (name.to_string(), Value::Bool(true)))
            .collect();

        Self {
            variables: TweetDetailVariables::new(tweet_id),
            features,
            field_toggles: TweetDetailFieldToggles::default(),
        }
    }

    /// Set one feature flag
    pub fn feature(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.features.insert(name.into(), Value::Bool(enabled));
        self
    }

    /// Full request URL on `api_host`
    ///
    /// Each of the three objects is serialized to JSON and query-escaped.
    pub fn url(&self, api_host: &str) -> Result<String> {
        let variables = query_escape(&serde_json::to_string(&self.variables)?);
        let features = query_escape(&serde_json::to_string(&self.features)?);
        let field_toggles = query_escape(&serde_json::to_string(&self.field_toggles)?);

        Ok(format!(
            "{}/i/api/graphql/{}/TweetDetail?variables={}&features={}&fieldToggles={}",
            api_host.trim_end_matches('/'),
            QUERY_ID,
            variables,
            features,
            field_toggles
        ))
    }
}

fn query_escape(raw: &str) -> String {
    url::form_urlencoded::byte_serialize(raw.as_bytes()).collect()
}

impl Helicon {
    /// Fetch a tweet and its conversation as opaque JSON
    pub async fn tweet_detail(&self, tweet_id: &str) -> Result<Value> {
        self.tweet_detail_with(&TweetDetailRequest::new(tweet_id)).await
    }

    /// Run a prepared TweetDetail request
    pub async fn tweet_detail_with(&self, request: &TweetDetailRequest) -> Result<Value> {
        let url = request.url(&self.config().endpoints.api_host)?;
        let body = self.get(&url).await?;
        debug!(
            tweet_id = %request.variables.focal_tweet_id,
            bytes = body.len(),
            "tweet detail fetched"
        );
        Ok(serde_json::from_slice(&body)?)
    }
}
