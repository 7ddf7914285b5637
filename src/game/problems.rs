//! Fixed problem bank the problem phase draws from.

use rand::seq::SliceRandom;

use crate::game::state::Problem;

struct ProblemSeed {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    market_analysis: &'static str,
}

const PROBLEM_BANK: &[ProblemSeed] = &[
    ProblemSeed {
        id: "campus-food-waste",
        title: "Campus Food Waste",
        description: "University dining halls throw away a third of the food they prepare while many students skip meals to save money.",
        market_analysis: "Roughly 20 million students in the region; dining contracts are renewed yearly and sustainability targets are now part of most tenders.",
    },
    ProblemSeed {
        id: "freelancer-invoicing",
        title: "Late Payments for Freelancers",
        description: "Independent designers and developers wait an average of 45 days to be paid, and many lack the tools to chase invoices.",
        market_analysis: "Freelancers make up a growing share of the workforce; existing accounting suites target small companies rather than individuals.",
    },
    ProblemSeed {
        id: "rural-clinic-scheduling",
        title: "Rural Clinic Scheduling",
        description: "Patients in rural areas travel hours to clinics only to find appointments overbooked or specialists unavailable.",
        market_analysis: "Public funding for rural health access has increased; most clinics still schedule by phone and paper.",
    },
    ProblemSeed {
        id: "small-retail-inventory",
        title: "Small Retail Inventory",
        description: "Independent shops over-order slow movers and run out of best sellers because they track stock by hand.",
        market_analysis: "Hundreds of thousands of independent retailers; point-of-sale adoption is high but analytics add-ons are expensive.",
    },
    ProblemSeed {
        id: "senior-isolation",
        title: "Loneliness Among Seniors",
        description: "Many older adults living alone go days without meaningful conversation, and families struggle to stay in touch.",
        market_analysis: "The over-65 population is the fastest growing age group; families and care providers already pay for check-in services.",
    },
];

/// Every problem in the bank.
pub fn problem_set() -> Vec<Problem> {
    PROBLEM_BANK.iter().map(to_problem).collect()
}

/// Uniformly random pick from the bank.
pub fn random_problem() -> Problem {
    let seed = PROBLEM_BANK
        .choose(&mut rand::thread_rng())
        .unwrap_or(&PROBLEM_BANK[0]);
    to_problem(seed)
}

fn to_problem(seed: &ProblemSeed) -> Problem {
    Problem {
        id: seed.id.to_string(),
        title: seed.title.to_string(),
        description: seed.description.to_string(),
        market_analysis: seed.market_analysis.to_string(),
    }
}
