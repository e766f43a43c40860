use civicroute::{
    Assessment, DeadlineStatus, Finding, JourneyResult, JourneyRun, LifeEvent, NextQuestion, RuleResult, RuleVerdict,
    ServiceEligibilityResult, ServiceVerdict,
};

mod ansi {
    pub const RESET: &str = "\x1b[0m";
    pub const DIM: &str = "\x1b[2m";
    pub const BOLD: &str = "\x1b[1m";

    pub const RED: &str = "\x1b[31m";
    pub const GREEN: &str = "\x1b[32m";
    pub const YELLOW: &str = "\x1b[33m";
    pub const BLUE: &str = "\x1b[34m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";

    pub struct Palette {
        enabled: bool,
    }

    impl Palette {
        pub fn new(enabled: bool) -> Self {
            Self { enabled }
        }

        pub fn paint(&self, s: impl AsRef<str>, color: &str) -> String {
            if self.enabled { format!("{}{}{}", color, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn bold(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", BOLD, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }

        pub fn dim(&self, s: impl AsRef<str>) -> String {
            if self.enabled { format!("{}{}{}", DIM, s.as_ref(), RESET) } else { s.as_ref().to_string() }
        }
    }
}

use ansi::Palette;

fn heading(palette: &Palette, title: &str) {
    println!("\n{}", palette.paint(format!("━━━ {title} ━━━"), ansi::GRAY));
}

pub fn print_events<'a>(events: impl Iterator<Item = &'a LifeEvent>, color: bool) {
    let palette = Palette::new(color);
    heading(&palette, "Life events");
    for event in events {
        println!("  {}  {}", palette.bold(palette.paint(&event.id, ansi::CYAN)), event.name);
        if let Some(description) = &event.description {
            println!("      {}", palette.dim(description));
        }
        println!("      {} {}", palette.dim("starts at:"), palette.paint(event.entry_nodes.join(", "), ansi::BLUE));
    }
    println!();
}

pub fn print_journey(run: &JourneyRun<'_>, color: bool) {
    let palette = Palette::new(color);
    let summary = &run.journey.summary;
    println!(
        "\n{}",
        palette.bold(palette.paint(format!("⚙  Journey: {}", summary.life_events.join(" + ")), ansi::CYAN))
    );

    print_phases(&run.journey, &palette);

    heading(&palette, "Summary");
    println!(
        "  Services: {}  │  Departments: {}  │  With deadlines: {}  │  Phases: {}",
        palette.paint(summary.total_services.to_string(), ansi::GREEN),
        palette.paint(summary.departments.to_string(), ansi::BLUE),
        palette.paint(summary.with_deadlines.to_string(), ansi::YELLOW),
        palette.paint(summary.phases.to_string(), ansi::CYAN),
    );
    if !run.metrics.discovery.unknown_events.is_empty() {
        println!(
            "  {} {}",
            palette.paint("Unknown life events:", ansi::YELLOW),
            run.metrics.discovery.unknown_events.join(", ")
        );
    }
    if !run.metrics.ordering.unplaced.is_empty() {
        println!(
            "  {} {}",
            palette.paint("Left out by a REQUIRES cycle:", ansi::RED),
            run.metrics.ordering.unplaced.join(", ")
        );
    }

    heading(&palette, "Timing");
    println!(
        "  Total: {}  │  Discovery: {} ({} visits, {} edges)  │  Ordering: {}",
        palette.paint(format!("{:?}", run.metrics.total), ansi::GREEN),
        palette.paint(format!("{:?}", run.metrics.discovery.duration), ansi::CYAN),
        run.metrics.discovery.visits,
        run.metrics.discovery.edges_examined,
        palette.dim(format!("{:?}", run.metrics.ordering.duration)),
    );
    println!();
}

fn print_phases(journey: &JourneyResult<'_>, palette: &Palette) {
    if journey.is_empty() {
        heading(palette, "Phases");
        println!("{}", palette.dim("  No services found"));
        println!("\n{}", palette.dim("  Tip: run `civicroute events` to list known life events"));
        return;
    }

    for phase in &journey.phases {
        heading(palette, &format!("Phase {}: {}", phase.phase, phase.label));
        for service in &phase.services {
            println!(
                "  {} {} {}",
                palette.bold(palette.paint(&service.node.name, ansi::GREEN)),
                palette.dim("│"),
                palette.paint(format!("{} · {}", service.node.dept, service.id()), ansi::BLUE),
            );
            if let Some(deadline) = &service.node.deadline {
                println!("      {} {}", palette.dim("deadline:"), palette.paint(deadline, ansi::YELLOW));
            }
            if !service.requires.is_empty() {
                println!("      {} {}", palette.dim("after:"), service.requires.join(", "));
            }
            if service.triggered_by.len() > 1 {
                println!("      {} {}", palette.dim("for:"), service.triggered_by.join(", "));
            }
        }
    }
}

pub fn print_service(result: &ServiceEligibilityResult<'_>, color: bool) {
    let palette = Palette::new(color);
    print_service_block(result, &palette, true);
    println!();
}

pub fn print_assessment(assessment: &Assessment<'_>, color: bool) {
    let palette = Palette::new(color);
    println!(
        "\n{}",
        palette.bold(palette.paint(
            format!("⚙  Assessment: {}", assessment.journey.summary.life_events.join(" + ")),
            ansi::CYAN
        ))
    );

    for phase in &assessment.journey.phases {
        heading(&palette, &format!("Phase {}: {}", phase.phase, phase.label));
        for service in &phase.services {
            if let Some(result) = assessment.eligibility.iter().find(|r| r.service_id == service.id()) {
                print_service_block(result, &palette, false);
            }
        }
    }

    heading(&palette, "Next question");
    match &assessment.next_question {
        Some(next) => print_next_question(next, &palette),
        None => println!("{}", palette.dim("  Nothing left to ask")),
    }
    println!();
}

pub fn print_findings(findings: &[Finding], color: bool) {
    let palette = Palette::new(color);
    heading(&palette, "Corpus lint");
    if findings.is_empty() {
        println!("  {}", palette.paint("✓ no findings", ansi::GREEN));
    }
    for finding in findings {
        println!("  {} {}", palette.paint("✗", ansi::RED), finding);
    }
    println!();
}

fn print_service_block(result: &ServiceEligibilityResult<'_>, palette: &Palette, detailed: bool) {
    println!(
        "  {} {} {}",
        fmt_verdict(result.verdict, palette),
        palette.bold(result.service_name),
        palette.dim(format!("({})", result.service_id)),
    );
    if let Some(status) = result.deadline_status {
        let text = match status {
            DeadlineStatus::Ok => palette.paint("within deadline", ansi::GREEN),
            DeadlineStatus::Overdue => palette.paint("deadline passed", ansi::RED),
            DeadlineStatus::UnknownTriggerDate => palette.dim("deadline unknown"),
        };
        println!("      {} {}", palette.dim("deadline:"), text);
    }
    if detailed {
        for rule in &result.rule_results {
            print_rule(rule, palette, 3);
        }
    }
    for question in &result.pending_questions {
        println!("      {} {}", palette.paint("?", ansi::YELLOW), question);
    }
}

fn print_rule(result: &RuleResult<'_>, palette: &Palette, depth: usize) {
    let indent = "  ".repeat(depth);
    let mark = match result.verdict {
        RuleVerdict::Pass => palette.paint("✓", ansi::GREEN),
        RuleVerdict::Fail => palette.paint("✗", ansi::RED),
        RuleVerdict::Unknown => palette.paint("?", ansi::YELLOW),
    };
    let missing = match &result.missing_field {
        Some(field) => palette.dim(format!("  missing {field}")),
        None => String::new(),
    };
    println!("{indent}{mark} {} {}{missing}", palette.paint(result.rule.kind(), ansi::BLUE), result.rule.label());
    for child in &result.children {
        print_rule(child, palette, depth + 1);
    }
}

fn print_next_question(next: &NextQuestion, palette: &Palette) {
    println!("  {}", palette.bold(palette.paint(&next.question, ansi::CYAN)));
    if let Some(field) = &next.field {
        println!("      {} {}", palette.dim("answer with:"), palette.paint(format!("--fact {field}=…"), ansi::BLUE));
    }
    println!("      {} {}", palette.dim("unblocks:"), next.services.join(", "));
}

fn fmt_verdict(verdict: ServiceVerdict, palette: &Palette) -> String {
    match verdict {
        ServiceVerdict::Eligible => palette.paint("[eligible]", ansi::GREEN),
        ServiceVerdict::NotEligible => palette.paint("[not eligible]", ansi::RED),
        ServiceVerdict::NeedsMoreInfo => palette.paint("[needs info]", ansi::YELLOW),
    }
}
