//! Demo data the mock services start with.

use chrono::{TimeZone, Utc};
use talentloom_core::{
    Availability, BillingPlan, Candidate, CandidateId, CompanyId, Compensation, EntityIdType,
    ExperienceLevel, Invoice, InvoiceId, JobId, JobPosting, JobStatus, MatchScore, Offer, OfferId,
    OfferStatus, PayFrequency, Payout, PayoutId, PayoutStatus, PipelineItem, PipelineItemId,
    PipelineStage, SalaryRange, Timestamp,
};

pub(crate) fn at(year: i32, month: u32, day: u32) -> Timestamp {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .unwrap_or_default()
}

fn usd(min: u64, max: u64) -> SalaryRange {
    SalaryRange {
        min,
        max,
        currency: "USD".to_string(),
    }
}

fn strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|v| v.to_string()).collect()
}

pub(crate) fn candidates() -> Vec<Candidate> {
    vec![
        Candidate {
            id: CandidateId::new("1"),
            name: "Sarah Chen".to_string(),
            email: "sarah.chen@email.com".to_string(),
            skills: strings(&["React", "TypeScript", "Node.js", "GraphQL"]),
            track: "Frontend Development".to_string(),
            reputation: 4.8,
            experience: "5+ years".to_string(),
            location: "San Francisco, CA".to_string(),
            availability: Availability::Available,
            salary_expectation: Some(usd(120_000, 150_000)),
            bio: "Senior frontend developer with expertise in React ecosystem and modern web technologies.".to_string(),
            created_at: at(2024, 1, 1),
            updated_at: at(2024, 3, 15),
        },
        Candidate {
            id: CandidateId::new("2"),
            name: "Marcus Johnson".to_string(),
            email: "marcus.j@email.com".to_string(),
            skills: strings(&["Python", "Django", "PostgreSQL", "AWS"]),
            track: "Backend Development".to_string(),
            reputation: 4.6,
            experience: "4 years".to_string(),
            location: "New York, NY".to_string(),
            availability: Availability::Available,
            salary_expectation: Some(usd(110_000, 140_000)),
            bio: "Backend specialist with strong experience in Python and cloud architecture.".to_string(),
            created_at: at(2024, 1, 15),
            updated_at: at(2024, 3, 10),
        },
        Candidate {
            id: CandidateId::new("3"),
            name: "Elena Rodriguez".to_string(),
            email: "elena.r@email.com".to_string(),
            skills: strings(&["React", "Vue.js", "JavaScript", "CSS3"]),
            track: "Frontend Development".to_string(),
            reputation: 4.9,
            experience: "6+ years".to_string(),
            location: "Austin, TX".to_string(),
            availability: Availability::Busy,
            salary_expectation: Some(usd(130_000, 160_000)),
            bio: "Senior frontend architect with deep expertise in modern frameworks.".to_string(),
            created_at: at(2023, 12, 1),
            updated_at: at(2024, 3, 12),
        },
    ]
}

#[allow(clippy::too_many_arguments)]
fn job(
    id: &str,
    title: &str,
    description: &str,
    skills: &[&str],
    track: &str,
    level: ExperienceLevel,
    location: &str,
    remote: bool,
    salary: SalaryRange,
    company: (&str, &str),
    counts: (u32, u32),
    created_at: Timestamp,
    updated_at: Timestamp,
) -> JobPosting {
    JobPosting {
        id: JobId::new(id),
        title: title.to_string(),
        description: description.to_string(),
        requirements: Vec::new(),
        skills: strings(skills),
        track: track.to_string(),
        experience_level: level,
        location: location.to_string(),
        remote,
        salary_range: salary,
        company_id: CompanyId::new(company.0),
        company_name: company.1.to_string(),
        status: JobStatus::Active,
        applications_count: counts.0,
        views_count: counts.1,
        created_at,
        updated_at,
        expires_at: None,
    }
}

pub(crate) fn jobs() -> Vec<JobPosting> {
    let mut jobs = vec![
        job(
            "1",
            "Senior Frontend Developer",
            "We are looking for an experienced frontend developer to join our growing team.",
            &["React", "TypeScript", "Jest", "CSS3"],
            "Frontend Development",
            ExperienceLevel::Senior,
            "San Francisco, CA",
            true,
            usd(120_000, 160_000),
            ("1", "TechCorp Inc."),
            (24, 156),
            at(2024, 3, 1),
            at(2024, 3, 15),
        ),
        job(
            "2",
            "Backend Engineer",
            "Join our backend team to build scalable microservices architecture.",
            &["Python", "Django", "PostgreSQL", "Docker"],
            "Backend Development",
            ExperienceLevel::Mid,
            "New York, NY",
            false,
            usd(100_000, 130_000),
            ("2", "StartupXYZ"),
            (18, 89),
            at(2024, 2, 15),
            at(2024, 3, 10),
        ),
        job(
            "3",
            "Full Stack Developer",
            "Looking for a versatile developer to work on both frontend and backend.",
            &["React", "Node.js", "MongoDB", "Express"],
            "Full Stack Development",
            ExperienceLevel::Mid,
            "Remote",
            true,
            usd(90_000, 120_000),
            ("3", "RemoteFirst Co."),
            (31, 203),
            at(2024, 3, 5),
            at(2024, 3, 14),
        ),
    ];
    jobs[0].requirements = strings(&[
        "5+ years React experience",
        "Strong TypeScript skills",
        "Experience with testing",
    ]);
    jobs[1].requirements = strings(&[
        "3+ years Python experience",
        "Database design skills",
        "API development",
    ]);
    jobs[2].requirements = strings(&[
        "Full stack experience",
        "React and Node.js",
        "Database knowledge",
    ]);
    jobs
}

pub(crate) fn pipeline() -> Vec<PipelineItem> {
    let item = |id: &str,
                candidate: (&str, &str),
                job: (&str, &str),
                stage: PipelineStage,
                notes: &str,
                added_by: &str,
                score: f64,
                added_at: Timestamp,
                updated_at: Timestamp| PipelineItem {
        id: PipelineItemId::new(id),
        candidate_id: CandidateId::new(candidate.0),
        candidate_name: candidate.1.to_string(),
        job_id: JobId::new(job.0),
        job_title: job.1.to_string(),
        stage,
        notes: notes.to_string(),
        added_at,
        updated_at,
        added_by: added_by.to_string(),
        match_score: Some(score),
    };
    vec![
        item(
            "p1",
            ("1", "Sarah Chen"),
            ("1", "Senior Frontend Developer"),
            PipelineStage::Shortlisted,
            "Strong React background, great portfolio",
            "Recruiter 1",
            92.0,
            at(2024, 3, 10),
            at(2024, 3, 12),
        ),
        item(
            "p2",
            ("2", "Marcus Johnson"),
            ("2", "Backend Engineer"),
            PipelineStage::Interview,
            "Scheduled for technical interview",
            "Recruiter 2",
            88.0,
            at(2024, 3, 8),
            at(2024, 3, 13),
        ),
        item(
            "p3",
            ("3", "Elena Rodriguez"),
            ("1", "Senior Frontend Developer"),
            PipelineStage::Offer,
            "Excellent interview performance",
            "Recruiter 1",
            95.0,
            at(2024, 3, 5),
            at(2024, 3, 14),
        ),
    ]
}

pub(crate) fn offers() -> Vec<Offer> {
    vec![
        Offer {
            id: OfferId::new("o1"),
            candidate_id: CandidateId::new("1"),
            candidate_name: "Sarah Chen".to_string(),
            job_id: JobId::new("1"),
            job_title: "Senior Frontend Developer".to_string(),
            status: OfferStatus::Sent,
            salary: Compensation {
                amount: 140_000,
                currency: "USD".to_string(),
                frequency: PayFrequency::Yearly,
            },
            start_date: at(2024, 4, 1),
            expires_at: at(2024, 3, 25),
            terms: "Full-time position with benefits".to_string(),
            benefits: strings(&["Health Insurance", "401k", "Remote Work", "PTO"]),
            created_at: at(2024, 3, 12),
            updated_at: at(2024, 3, 13),
            sent_at: Some(at(2024, 3, 13)),
            responded_at: None,
        },
        Offer {
            id: OfferId::new("o2"),
            candidate_id: CandidateId::new("3"),
            candidate_name: "Elena Rodriguez".to_string(),
            job_id: JobId::new("1"),
            job_title: "Senior Frontend Developer".to_string(),
            status: OfferStatus::Accepted,
            salary: Compensation {
                amount: 150_000,
                currency: "USD".to_string(),
                frequency: PayFrequency::Yearly,
            },
            start_date: at(2024, 4, 15),
            expires_at: at(2024, 3, 20),
            terms: "Senior level position with equity".to_string(),
            benefits: strings(&["Health Insurance", "401k", "Stock Options", "Remote Work"]),
            created_at: at(2024, 3, 10),
            updated_at: at(2024, 3, 15),
            sent_at: Some(at(2024, 3, 11)),
            responded_at: Some(at(2024, 3, 15)),
        },
    ]
}

pub(crate) fn matches() -> Vec<MatchScore> {
    let score = |candidate: &str, job: &str, scores: [f64; 5], reasons: &[&str]| MatchScore {
        candidate_id: CandidateId::new(candidate),
        job_id: JobId::new(job),
        score: scores[0],
        reasons: strings(reasons),
        skills_match: scores[1],
        experience_match: scores[2],
        availability_match: scores[3],
        location_match: scores[4],
    };
    vec![
        score(
            "1",
            "1",
            [92.0, 95.0, 90.0, 100.0, 85.0],
            &["Strong React experience", "TypeScript expertise", "Location match"],
        ),
        score(
            "2",
            "2",
            [88.0, 90.0, 85.0, 100.0, 75.0],
            &["Python expertise", "Database skills", "Experience level match"],
        ),
        score(
            "3",
            "1",
            [95.0, 98.0, 95.0, 80.0, 90.0],
            &["Excellent React skills", "Senior experience", "High reputation"],
        ),
    ]
}

pub(crate) fn plan() -> BillingPlan {
    BillingPlan {
        name: "Professional".to_string(),
        price: 299,
        currency: "USD".to_string(),
        frequency: "monthly".to_string(),
        features: strings(&[
            "Up to 50 active job postings",
            "Unlimited candidate searches",
            "Advanced AI matching",
            "Pipeline management",
            "Custom reports & analytics",
            "Priority support",
        ]),
    }
}

pub(crate) fn invoices() -> Vec<Invoice> {
    vec![Invoice {
        id: InvoiceId::new("INV-2024-001"),
        date: "2024-03-01".to_string(),
        amount: 299,
        status: "paid".to_string(),
        description: "Professional Plan - March 2024".to_string(),
    }]
}

pub(crate) fn payouts() -> Vec<Payout> {
    vec![Payout {
        id: PayoutId::new("payout_1"),
        candidate_id: CandidateId::new("1"),
        amount: 5000,
        currency: "USD".to_string(),
        status: PayoutStatus::Completed,
        description: "Placement fee for Sarah Chen".to_string(),
        processed_at: Some(at(2024, 3, 15)),
        created_at: at(2024, 3, 10),
    }]
}
