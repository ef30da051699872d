use crate::infra::{build_service, parse_date};
use chrono::{Local, NaiveDate};
use clap::Args;
use std::fs::File;
use std::path::PathBuf;
use talent_pulse::error::AppError;
use talent_pulse::workflows::health::{
    import_copc_csv, AssessmentMetricSet, CopcMetric, CopcReading, EvaluationOutcome,
    Nr1Dimension, Nr1Risk, OrgId, Period, PlanEvent, Subject, TfciDimension, TfciRating,
};

#[derive(Args, Debug)]
pub(crate) struct ScoreReportArgs {
    /// COPC metrics CSV export (one row per employee and period)
    #[arg(long)]
    pub(crate) copc_csv: PathBuf,
    /// Organization the export belongs to
    #[arg(long, default_value = "org-demo")]
    pub(crate) org: String,
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
}

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Evaluation date (defaults to today)
    #[arg(long, value_parser = parse_date)]
    pub(crate) today: Option<NaiveDate>,
    /// Optional COPC CSV export to enrich the demo data
    #[arg(long)]
    pub(crate) copc_csv: Option<PathBuf>,
    /// Skip the plan lifecycle portion of the demo
    #[arg(long)]
    pub(crate) skip_plans: bool,
}

pub(crate) fn run_score_report(args: ScoreReportArgs) -> Result<(), AppError> {
    let ScoreReportArgs {
        copc_csv,
        org,
        today,
    } = args;

    let org_id = OrgId(org);
    let today = today.unwrap_or_else(|| Local::now().date_naive());

    let file = File::open(&copc_csv)?;
    let sets = import_copc_csv(file, &org_id)?;
    println!(
        "Imported {} metric set(s) from {}",
        sets.len(),
        copc_csv.display()
    );

    let handles = build_service();
    for set in &sets {
        handles.metrics.insert(set.clone());
    }

    for (subject, period) in handles.metrics.subjects(&org_id) {
        let outcome = handles.service.evaluate(&org_id, &subject, period, today)?;
        print_outcome(&outcome);
    }

    let alerts = handles.alerts.events();
    if !alerts.is_empty() {
        println!("\nAlerts raised:");
        for alert in alerts {
            println!(
                "  - {:?} {} ({})",
                alert.kind,
                alert.dimension.label(),
                alert.severity.label()
            );
        }
    }

    Ok(())
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        today,
        copc_csv,
        skip_plans,
    } = args;

    let today = today.unwrap_or_else(|| Local::now().date_naive());
    let org_id = OrgId("org-demo".to_string());
    let handles = build_service();

    println!("Organizational health scoring demo");

    let period = demo_period(today);
    handles.metrics.insert(steady_employee_set(&org_id, period));
    handles
        .metrics
        .insert(overloaded_employee_set(&org_id, period));

    if let Some(path) = copc_csv {
        let file = File::open(&path)?;
        let imported = import_copc_csv(file, &org_id)?;
        println!("- Enriched demo data with {} row(s) from {}", imported.len(), path.display());
        for set in imported {
            handles.metrics.insert(set);
        }
    }

    for (subject, period) in handles.metrics.subjects(&org_id) {
        let outcome = handles.service.evaluate(&org_id, &subject, period, today)?;
        print_outcome(&outcome);
    }

    let alerts = handles.alerts.events();
    println!("\n{} alert(s) dispatched", alerts.len());

    if skip_plans {
        return Ok(());
    }

    println!("\nPlan lifecycle demo");
    let overloaded = Subject::employee("emp-demo-2");
    let plans = handles.service.plans_for_subject(&org_id, &overloaded)?;
    match plans.first() {
        Some(plan) => {
            println!(
                "- Plan {} opened for {} ({})",
                plan.id.0,
                plan.dimension.label(),
                plan.severity.label()
            );
            for action in &plan.suggested_actions {
                println!("    * {action}");
            }
            let reviewed = handles
                .service
                .apply_plan_event(&plan.id, PlanEvent::Review)?;
            println!("- Plan moved to {}", reviewed.state.label());
            let resolved = handles
                .service
                .apply_plan_event(&plan.id, PlanEvent::Resolve)?;
            println!("- Plan moved to {}", resolved.state.label());
        }
        None => println!("- No plans were opened this run"),
    }

    Ok(())
}

fn print_outcome(outcome: &EvaluationOutcome) {
    match outcome {
        EvaluationOutcome::Scored {
            result,
            reconciliation,
        } => {
            println!(
                "- {} {} -> composite {:.1} ({})",
                result.subject,
                result.period,
                result.composite,
                result.tier.label()
            );
            for signal in &result.signals {
                println!(
                    "    breach: {} at {:.2} (threshold {:.2})",
                    signal.dimension.label(),
                    signal.observed,
                    signal.threshold
                );
            }
            if !reconciliation.opened.is_empty() {
                println!("    opened {} plan(s)", reconciliation.opened.len());
            }
        }
        EvaluationOutcome::NotYetComputable { subject, period } => {
            println!("- {subject} {period} -> no score yet (insufficient data)");
        }
    }
}

fn demo_period(today: NaiveDate) -> Period {
    use chrono::Datelike;
    Period::new(today.year(), today.month()).expect("chrono months are 1-12")
}

fn steady_employee_set(org_id: &OrgId, period: Period) -> AssessmentMetricSet {
    let mut set =
        AssessmentMetricSet::empty(org_id.clone(), Subject::employee("emp-demo-1"), period);
    set.tfci = vec![
        TfciRating {
            dimension: TfciDimension::Technical,
            rating: 4.4,
        },
        TfciRating {
            dimension: TfciDimension::Interpersonal,
            rating: 4.6,
        },
    ];
    set.nr1 = vec![
        Nr1Risk {
            dimension: Nr1Dimension::WorkloadPace,
            risk: 1.0,
        },
        Nr1Risk {
            dimension: Nr1Dimension::RecoveryBoundaries,
            risk: 1.0,
        },
    ];
    set.copc = vec![
        CopcReading {
            metric: CopcMetric::QualityScore,
            value: 94.0,
        },
        CopcReading {
            metric: CopcMetric::AbsenteeismRate,
            value: 2.0,
        },
    ];
    set
}

fn overloaded_employee_set(org_id: &OrgId, period: Period) -> AssessmentMetricSet {
    let mut set =
        AssessmentMetricSet::empty(org_id.clone(), Subject::employee("emp-demo-2"), period);
    set.tfci = vec![TfciRating {
        dimension: TfciDimension::Technical,
        rating: 3.0,
    }];
    set.nr1 = vec![
        Nr1Risk {
            dimension: Nr1Dimension::WorkloadPace,
            risk: 3.0,
        },
        Nr1Risk {
            dimension: Nr1Dimension::RecoveryBoundaries,
            risk: 3.0,
        },
    ];
    set.copc = vec![
        CopcReading {
            metric: CopcMetric::QualityScore,
            value: 68.0,
        },
        CopcReading {
            metric: CopcMetric::AbsenteeismRate,
            value: 13.0,
        },
        CopcReading {
            metric: CopcMetric::OperationalStressLevel,
            value: 3.0,
        },
    ];
    set
}
