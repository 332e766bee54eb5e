//! Prompt templates and fixed replies.

use std::fmt::Write;

use super::FarmDetails;
use crate::segment::SegmentInsights;
use crate::utils::mean;

/// Reply to messages that are not about agriculture.
pub const OFF_TOPIC_REPLY: &str = "I'm an agricultural expert focused on helping with farming and crop-related questions.
Please ask me about topics like:
- Rice cultivation and yield optimization
- Soil management and fertilizers
- Irrigation techniques
- Crop diseases and pest control
- Weather and climate impacts on farming
- Harvest timing and post-harvest handling

How can I help you with your agricultural needs?";

/// Greeting returned with a new chat session.
pub const WELCOME_MESSAGE: &str = "Hello! I'm your agricultural advisor. I can help you with farming questions, especially about rice cultivation, soil management, irrigation, and crop optimization. What would you like to know?";

const NOT_SPECIFIED: &str = "Not specified";

/// Model figures for one region/soil pair, as quoted in the advisor prompt.
pub(super) fn model_context(region: &str, soil: &str, insights: &SegmentInsights) -> String {
    let mut out = format!("\nBased on our predictive model for {region} with {soil} soil:\n");
    if let Some(range) = insights.range_label() {
        let _ = writeln!(out, "- Expected yield range: {range}");
    }
    if let Some(average) = insights.average_label() {
        let _ = writeln!(out, "- Average predicted yield: {average}");
    }
    let _ = writeln!(out, "- Model confidence: {}", insights.confidence_label());
    let _ = writeln!(out, "- Data based on {} samples", insights.sample_size);
    let _ = writeln!(out, "- Key factors: {}", insights.key_factor_names());
    out
}

/// Prompt sent to the chat session for one user message.
pub(super) fn advisor_prompt(message: &str, model_context: &str) -> String {
    format!(
        "You are an expert agricultural advisor specializing in crop cultivation, particularly rice farming.
Your responses must be:
1. Strictly focused on agriculture, farming, and crop-related topics
2. Practical and actionable
3. Based on scientific agricultural principles
4. Helpful for farmers and agricultural professionals

{model_context}

User's question: {message}

Provide detailed, practical advice while staying within agricultural topics. If the question is not agriculture-related, politely redirect to farming topics."
    )
}

/// Wrap a reply that mentions none of the core keywords.
pub(super) fn agricultural_preamble(reply: &str) -> String {
    format!(
        "Based on agricultural best practices: {reply}\n\nFor more specific advice about your crops, please provide details about your farming situation."
    )
}

/// One-shot prompt for farming instructions. `predictions` must be non-empty.
pub(super) fn instructions_prompt(
    predictions: &[f64],
    farm: &FarmDetails,
    insights: Option<&SegmentInsights>,
) -> String {
    let field = |v: &Option<String>| v.clone().unwrap_or_else(|| NOT_SPECIFIED.to_string());
    let values = predictions
        .iter()
        .map(|p| format!("{p}"))
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "As an expert agricultural advisor, provide comprehensive farming instructions based on:

Predicted Yield Values: [{values}]
Average Predicted Yield: {average:.2} tons/hectare

Farm Details:
- State: {state}
- Soil Type: {soil}
- Land Area: {area} hectares
- Irrigation: {irrigation}
- Fertilizer: {fertilizer}

",
        average = mean(predictions),
        state = field(&farm.region),
        soil = field(&farm.soil),
        area = field(&farm.land_area),
        irrigation = field(&farm.irrigation),
        fertilizer = field(&farm.fertilizer),
    );

    if let Some(insights) = insights {
        let _ = write!(
            prompt,
            "
Model Analysis:
- Model Confidence: {}
- Key Influencing Factors: {}
- Data based on {} similar farms

",
            insights.confidence_label(),
            insights.key_factor_names(),
            insights.sample_size
        );
    }

    prompt.push_str(
        "
Provide specific, actionable recommendations for:
1. Yield optimization strategies
2. Soil and nutrient management
3. Water and irrigation planning
4. Pest and disease prevention
5. Harvest timing and post-harvest handling
6. Market preparation advice

Keep advice practical and region-appropriate.",
    );
    prompt
}
