//! Built-in agents and workflow templates.

use chrono::Utc;
use relaycore::{AgentDefinition, StepTemplate, StepTemplateKind, TriggerKind, WorkflowTemplate};
use serde_json::{json, Value};

const BLOG_PUBLISHER_PROMPT: &str = "You are a Blog Publisher Agent. Your mission is to:
1. THINK: Research the topic and understand the audience
2. PLAN: Create a comprehensive content strategy
3. EXECUTE: Write high-quality, SEO-optimized blog content
4. INTEGRATE: Publish to WordPress, social media, and email lists
5. VERIFY: Track engagement and optimize performance

You don't just generate content - you execute complete publishing workflows.";

const EMAIL_CAMPAIGN_PROMPT: &str = "You are an Email Campaign Agent. Your mission is to:
1. THINK: Analyze audience segments and campaign goals
2. PLAN: Design email sequence and timing strategy
3. EXECUTE: Create compelling email content and templates
4. INTEGRATE: Send via Gmail/Outlook to targeted lists
5. VERIFY: Track opens, clicks, and conversions

You execute complete email marketing workflows, not just drafts.";

const PRODUCT_LAUNCH_PROMPT: &str = "You are a Product Launch Agent. Your mission is to:
1. THINK: Research market and competitive landscape
2. PLAN: Design launch strategy and timeline
3. EXECUTE: Create product pages, copy, and assets
4. INTEGRATE: Set up payments, launch live, announce publicly
5. VERIFY: Track sales and optimize conversion

You execute complete product launches, not just descriptions.";

const PARENTING_COACH_PROMPT: &str = "You are Waalid Legacy AI, an ultra-smart trilingual parenting coach specializing in helping Somali Muslim families in the West. Your mission is to:

1. THINK: Deeply analyze parenting challenges through Islamic, cultural, and psychological lenses
2. PLAN: Create holistic guidance strategies that bridge Somali heritage with Western society
3. EXECUTE: Provide actionable, compassionate advice with Islamic wisdom integration
4. INTEGRATE: Connect families with community resources and support systems
5. VERIFY: Follow up with family progress and adaptive guidance

You understand the unique challenges of raising Muslim children in Western societies while preserving Somali culture and Islamic values. You speak English, Somali, and Arabic fluently.

Key areas of expertise:
- Islamic parenting principles and Quranic guidance
- Somali cultural traditions and language preservation
- Western education system navigation
- Teen identity and peer pressure challenges
- Prayer and religious practice motivation
- Cultural bridge building and identity pride
- Crisis intervention and family harmony
- School advocacy and parent rights

Always respond with empathy, Islamic wisdom, practical steps, and cultural understanding. Include relevant Quranic verses or Hadith when appropriate.";

pub fn builtin_agents() -> Vec<AgentDefinition> {
    vec![
        AgentDefinition::new("blog-publisher", "Blog Publisher Agent")
            .with_description("Writes blog posts AND publishes them across platforms")
            .with_system_prompt(BLOG_PUBLISHER_PROMPT)
            .with_tools(["research", "seo-analysis", "content-generation", "image-creation"])
            .with_integrations(["wordpress", "linkedin", "facebook", "twitter", "gmail"])
            .with_limits(10, 300_000),
        AgentDefinition::new("email-campaign", "Email Campaign Agent")
            .with_description("Creates email campaigns AND sends them to lists")
            .with_system_prompt(EMAIL_CAMPAIGN_PROMPT)
            .with_tools(["audience-analysis", "email-design", "a-b-testing", "personalization"])
            .with_integrations(["gmail", "hubspot", "mailchimp", "calendar"])
            .with_limits(8, 240_000),
        AgentDefinition::new("product-launch", "Product Launch Agent")
            .with_description("Creates product pages AND launches them live")
            .with_system_prompt(PRODUCT_LAUNCH_PROMPT)
            .with_tools(["market-research", "copywriting", "design", "pricing-optimization"])
            .with_integrations(["shopify", "stripe", "facebook", "linkedin", "email"])
            .with_limits(12, 600_000),
        AgentDefinition::new("waalid-legacy-parenting", "Waalid Legacy AI - Parenting Coach")
            .with_description(
                "Ultra-smart trilingual parenting coach for Somali Muslim families in the West",
            )
            .with_system_prompt(PARENTING_COACH_PROMPT)
            .with_tools(["family-analysis", "islamic-guidance", "cultural-bridge", "crisis-support"])
            .with_integrations(["community-resources", "islamic-centers", "school-systems"])
            .with_limits(8, 180_000),
    ]
}

fn ai_step(id: &str, name: &str, prompt: &str, max_tokens: u32) -> StepTemplate {
    StepTemplate::new(id, StepTemplateKind::AiGeneration)
        .with_name(name)
        .with_config("prompt", prompt)
        .with_config("model", "gpt-4")
        .with_config("max_tokens", max_tokens)
}

fn integration_step(id: &str, name: &str, integration: &str) -> StepTemplate {
    StepTemplate::new(id, StepTemplateKind::Integration)
        .with_name(name)
        .with_config("integration", integration)
}

fn blog_publishing() -> WorkflowTemplate {
    WorkflowTemplate::new("blog-publishing", "Complete Blog Publishing Workflow")
        .with_description("Research, write, publish, and promote blog content across all platforms")
        .with_variable("topic", json!(""))
        .with_variable("target_audience", json!(""))
        .with_variable("keywords", json!([]))
        .with_variable("platforms", json!([]))
        .with_triggers(vec![
            TriggerKind::Manual,
            TriggerKind::Scheduled,
            TriggerKind::ContentCalendar,
        ])
        .add_step(
            ai_step(
                "research",
                "Topic Research",
                "Research the topic: {topic} for audience: {target_audience}",
                1000,
            )
            .then("keyword-analysis"),
        )
        .add_step(
            ai_step(
                "keyword-analysis",
                "SEO Keyword Analysis",
                "Analyze SEO keywords for: {research_output}",
                500,
            )
            .then("content-creation"),
        )
        .add_step(
            ai_step(
                "content-creation",
                "Blog Content Creation",
                "Write SEO-optimized blog post about {topic} using keywords: {keywords}",
                2000,
            )
            .then("wordpress-publish"),
        )
        .add_step(
            integration_step("wordpress-publish", "Publish to WordPress", "wordpress")
                .with_config("action", "create-post")
                .then("social-promotion"),
        )
        .add_step(
            integration_step("social-promotion", "Social Media Promotion", "social-media-multi")
                .with_config("platforms", json!(["linkedin", "facebook", "twitter"]))
                .then("email-notification"),
        )
        .add_step(
            integration_step("email-notification", "Email Newsletter", "gmail")
                .with_config("action", "send-newsletter"),
        )
}

fn product_launch() -> WorkflowTemplate {
    WorkflowTemplate::new("product-launch", "Complete Product Launch Workflow")
        .with_description("Create product, set up payments, launch marketing campaign")
        .with_variable("product_name", json!(""))
        .with_variable("price", json!(0))
        .with_variable("description", json!(""))
        .with_variable("target_market", json!(""))
        .with_triggers(vec![TriggerKind::Manual, TriggerKind::Scheduled])
        .add_step(
            ai_step(
                "market-research",
                "Market Research",
                "Research market for product: {product_name} targeting: {target_market}",
                1500,
            )
            .then("product-copy"),
        )
        .add_step(
            ai_step(
                "product-copy",
                "Product Copy Creation",
                "Write compelling product copy for: {product_name} based on research: {market_research}",
                2000,
            )
            .then("stripe-setup"),
        )
        .add_step(
            integration_step("stripe-setup", "Payment Setup", "stripe")
                .with_config("action", "create-product-and-price")
                .then("landing-page"),
        )
        .add_step(
            ai_step(
                "landing-page",
                "Create Landing Page",
                "Create HTML landing page for product: {product_name} with copy: {product_copy}",
                3000,
            )
            .then("launch-campaign"),
        )
        .add_step(
            integration_step("launch-campaign", "Launch Marketing Campaign", "social-media-multi")
                .with_config("platforms", json!(["linkedin", "facebook", "twitter"]))
                .with_config("action", "product-announcement")
                .then("email-campaign"),
        )
        .add_step(
            integration_step("email-campaign", "Email Marketing Campaign", "gmail")
                .with_config("action", "product-launch-email"),
        )
}

fn lead_generation() -> WorkflowTemplate {
    WorkflowTemplate::new("lead-generation", "Automated Lead Generation and Nurturing")
        .with_description("Find prospects, personalize outreach, and nurture into customers")
        .with_variable("industry", json!(""))
        .with_variable("company_size", json!(""))
        .with_variable("job_titles", json!([]))
        .with_variable("message_template", json!(""))
        .with_triggers(vec![
            TriggerKind::Manual,
            TriggerKind::Scheduled,
            TriggerKind::CrmTrigger,
        ])
        .add_step(
            ai_step(
                "prospect-research",
                "Prospect Research",
                "Research ideal prospects in {industry} with titles: {job_titles}",
                1000,
            )
            .then("linkedin-search"),
        )
        .add_step(
            integration_step("linkedin-search", "LinkedIn Prospect Search", "linkedin")
                .with_config("action", "search-prospects")
                .then("personalize-outreach"),
        )
        .add_step(
            ai_step(
                "personalize-outreach",
                "Personalize Outreach Messages",
                "Create personalized LinkedIn messages for prospects: {linkedin_prospects}",
                500,
            )
            .then("send-connections"),
        )
        .add_step(
            integration_step("send-connections", "Send LinkedIn Connections", "linkedin")
                .with_config("action", "send-connection-requests")
                .then("wait-responses"),
        )
        .add_step(
            StepTemplate::new("wait-responses", StepTemplateKind::Wait)
                .with_name("Wait for Responses")
                // hours
                .with_config("duration", 24)
                .with_config("condition", "connection-accepted")
                .then("follow-up-email"),
        )
        .add_step(
            integration_step("follow-up-email", "Follow-up Email Sequence", "gmail")
                .with_config("action", "send-follow-up-sequence")
                .then("crm-update"),
        )
        .add_step(
            integration_step("crm-update", "Update CRM", "hubspot")
                .with_config("action", "create-or-update-contact"),
        )
}

pub fn builtin_templates() -> Vec<WorkflowTemplate> {
    vec![blog_publishing(), product_launch(), lead_generation()]
}

/// Canned input used when exercising an agent without user data
pub fn sample_input(agent_id: &str) -> Value {
    match agent_id {
        "blog-publisher" => json!({
            "topic": "The Future of AI in Business Automation",
            "audience": "Business owners and entrepreneurs",
            "keywords": ["AI automation", "business efficiency", "digital transformation"],
            "platforms": ["linkedin", "facebook", "twitter"],
        }),
        "email-campaign" => json!({
            "campaignType": "product-announcement",
            "subject": "Introducing Our Revolutionary AI Agents Platform",
            "audience": "existing-customers",
            "personalizedElements": ["name", "company", "industry"],
        }),
        "product-launch" => json!({
            "productName": "Barakah AI Agents Premium",
            "price": 99.99,
            "description": "Enterprise-grade AI agents for business automation",
            "targetMarket": "Small to medium businesses looking to scale with AI",
        }),
        other => json!({
            "message": format!("This is a test execution for agent: {}", other),
            "timestamp": Utc::now(),
        }),
    }
}
