use anyhow::Result;
use serde_json::Value;
use tracing::warn;

use crate::llm::GroqClient;
use crate::models::NewsItem;

const GROUP_SUMMARY_MAX_TOKENS: u32 = 1000;
const REFINE_MAX_TOKENS: u32 = 2000;

// Prompt parameters for the consolidation pass.
const REFINE_SUMMARY_WORDS: &str = "50-60";
const REFINE_TARGET_ITEMS: &str = "3-6";

const GROUP_SYSTEM_PROMPT: &str = "You are an expert at extracting key information from text \
sections and presenting it directly, like a news feed item. Analyze the provided text and \
identify the main topic, a concise summary, and any relevant hyperlinks. Provide the output \
strictly in JSON format. Avoid phrases like 'The author discusses...' or 'This text is about...'.";

const REFINE_SYSTEM_PROMPT: &str = "You are a ruthless news feed editor. Your job is to take \
preliminary extracted items and produce a final, extremely concise, high-impact, non-redundant \
list of feed items. Discard anything that isn't essential. Ensure valid JSON array output.";

/// Two-stage summarization: structured extraction per chunk group, then one
/// consolidation pass that merges duplicates into the final bounded list.
pub struct NewsletterSummarizer {
    llm: GroqClient,
}

impl NewsletterSummarizer {
    pub fn new(llm: GroqClient) -> Self {
        Self { llm }
    }

    /// Summarize one batch of chunks into a `{heading, summary, links}`
    /// record. Any failure (call, parse, or shape) is soft: it is logged
    /// and the batch is skipped so the pipeline can continue.
    pub async fn summarize_group(&self, text: &str) -> Option<NewsItem> {
        let prompt = group_prompt(text);

        let value = match self
            .llm
            .complete_json(Some(GROUP_SYSTEM_PROMPT), &prompt, GROUP_SUMMARY_MAX_TOKENS)
            .await
        {
            Ok(value) => value,
            Err(e) => {
                warn!("group summary call failed: {e:#}");
                return None;
            }
        };

        match NewsItem::validate(&value) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("group summary response rejected: {e}");
                None
            }
        }
    }

    /// Consolidate per-group records into the final deduplicated list.
    /// Returns the items plus a flag reporting whether the call failed and
    /// the original records were passed through instead.
    pub async fn refine(&self, drafts: &[NewsItem]) -> (Vec<NewsItem>, bool) {
        if drafts.is_empty() {
            return (Vec::new(), false);
        }

        let prompt = refine_prompt(&format_drafts(drafts));
        let result = self
            .llm
            .complete_json(Some(REFINE_SYSTEM_PROMPT), &prompt, REFINE_MAX_TOKENS)
            .await;

        refined_or_passthrough(result, drafts)
    }
}

/// Decide what the refinement stage hands back: the validated refined array,
/// or, when the call failed or returned an unusable shape, the original
/// drafts verbatim. Group-level results are never lost to a bad refinement.
fn refined_or_passthrough(result: Result<Value>, drafts: &[NewsItem]) -> (Vec<NewsItem>, bool) {
    match result {
        Ok(value) => match salvage_item_array(value) {
            Some(elements) => (validate_elements(&elements), false),
            None => {
                warn!("refinement returned an unusable shape, passing group summaries through");
                (drafts.to_vec(), true)
            }
        },
        Err(e) => {
            warn!("refinement call failed, passing group summaries through: {e:#}");
            (drafts.to_vec(), true)
        }
    }
}

fn validate_elements(elements: &[Value]) -> Vec<NewsItem> {
    elements
        .iter()
        .filter_map(|element| match NewsItem::validate(element) {
            Ok(item) => Some(item),
            Err(e) => {
                warn!("discarding malformed refined item: {e}");
                None
            }
        })
        .collect()
}

/// Accept the expected top-level array, or an array the model wrapped under
/// a known key (or a lone key) of an object.
fn salvage_item_array(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(elements) => Some(elements),
        Value::Object(mut map) => {
            for key in ["final_summaries", "final_items", "items"] {
                if let Some(Value::Array(elements)) = map.remove(key) {
                    return Some(elements);
                }
            }
            if map.len() == 1 {
                if let Some((_, Value::Array(elements))) = map.into_iter().next() {
                    return Some(elements);
                }
            }
            None
        }
        _ => None,
    }
}

fn format_drafts(drafts: &[NewsItem]) -> String {
    drafts
        .iter()
        .enumerate()
        .map(|(i, item)| {
            format!(
                "Item {}:\nHeading: {}\nSummary: {}\nLinks: {}",
                i + 1,
                item.heading,
                item.summary,
                item.links.join(", ")
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn group_prompt(text: &str) -> String {
    format!(
        r#"Analyze the following text block from a newsletter. Extract the primary topic and summarize its core information directly and concisely.

Extract the most important and directly relevant hyperlinks found within this specific text block.

Provide your response as a JSON object with the exact keys:
- "heading": A short, impactful title for the main topic (string, max 10 words). Write it as a direct headline.
- "summary": A direct summary of the main topic's core information (string, max 100 words). State the facts or key message directly.
- "links": A JSON array of URL strings that are directly relevant to the summary. Include only the most important 1-3 links. If no relevant links are found, provide an empty array [].

--- TEXT BLOCK START ---
{text}
--- TEXT BLOCK END ---

JSON Output:"#
    )
}

fn refine_prompt(input_text: &str) -> String {
    format!(
        r#"Review the following list of extracted newsletter items. They may contain duplicates, low-impact information, or similar topics.

Your task is to RUTHLESSLY EDIT and CONSOLIDATE these into a final list of high-impact news feed items:
1. Identify the absolute **most important and distinct** topics.
2. For each key topic, create **one single** final item, merging information if necessary.
3. Write a compelling, direct 'heading' (max 10 words) and 'summary' (max {REFINE_SUMMARY_WORDS} words) for each final item. Focus on the core news/takeaway.
4. Compile **only unique and essential** 'links' for each final item (max 2-3 links).
5. **Discard redundant items or topics that aren't crucial news.** Aim for quality over quantity.
6. Produce a final list of roughly **{REFINE_TARGET_ITEMS} final items** (fewer is better if the content isn't impactful).
7. Output **only** a valid JSON array where each element is a JSON object with the exact keys "heading", "summary", and "links". Do not include items that are not significant news.

--- INPUT ITEMS ---
{input_text}
--- END INPUT ITEMS ---

Final High-Impact JSON Array Output ({REFINE_TARGET_ITEMS} items max):"#
    )
}
