//! Store-backed entry points tying record fetch to the analysis passes.

use tracing::debug;

use ledgernet_core::time::{now_unix, SECONDS_PER_DAY, SECONDS_PER_MONTH};
use ledgernet_core::{DateRange, TransactionKind};
use ledgernet_health::{
    analyze as health_analyze, compare_periods, HealthScore, PeriodComparison, ScoringConfig,
};

use crate::cash_flow::{
    analyze_cash_flow, project_cash_flow, CashFlowOptions, CashFlowProjection, CashFlowReport,
};
use crate::categories::{
    analyze_categories, compare_category_periods, CategoryComparison, CategoryOptions,
    CategoryReport,
};
use crate::engine::{analyze_network, AnalysisOptions, GraphType, NetworkAnalysis};
use crate::error::AnalyticsError;
use crate::goals::{
    analyze_goals, compare_goals, reallocation_strategy, GoalComparison, GoalReport,
    ReallocationPlan,
};
use crate::institutions::{
    analyze_institutions, compare_institutions, InstitutionComparison, InstitutionReport,
};
use crate::store::RecordStore;

/// Months of history behind a cash-flow projection.
const PROJECTION_HISTORY_MONTHS: u32 = 6;

/// Analysis service over a record store.
pub struct NetworkAnalytics<S> {
    store: S,
}

impl<S: RecordStore> NetworkAnalytics<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Fetch the user's records and analyze the requested graph.
    ///
    /// The window applies to transactions only. Goal–institution graphs
    /// ignore it entirely so completed goals keep their funding links.
    pub fn analyze(
        &self,
        user_id: &str,
        graph_type: GraphType,
        period: Option<DateRange>,
        options: &AnalysisOptions,
    ) -> Result<NetworkAnalysis, AnalyticsError> {
        let institutions = self.store.institutions(user_id)?;
        let goals = self.store.goals(user_id)?;
        let window = match graph_type {
            GraphType::GoalInstitution => None,
            _ => period,
        };
        let transactions = self.store.transactions(user_id, window.as_ref())?;
        debug!(
            user_id,
            graph_type = %graph_type,
            institutions = institutions.len(),
            transactions = transactions.len(),
            goals = goals.len(),
            "records fetched"
        );

        let mut analysis =
            analyze_network(graph_type, &institutions, &transactions, &goals, options)?;
        analysis.period = window;
        Ok(analysis)
    }

    /// Health score over the trailing `period_days` window.
    pub fn health_score(
        &self,
        user_id: &str,
        period_days: i64,
        include_recommendations: bool,
        config: &ScoringConfig,
    ) -> Result<HealthScore, AnalyticsError> {
        let end = now_unix();
        let range = DateRange::new(end - period_days * SECONDS_PER_DAY, end)?;
        self.health_in_range(user_id, range, period_days, include_recommendations, config)
    }

    /// Health scores for the trailing window and the window before it,
    /// compared. Recommendations are left off both scores.
    pub fn health_comparison(
        &self,
        user_id: &str,
        period_days: i64,
        config: &ScoringConfig,
    ) -> Result<PeriodComparison, AnalyticsError> {
        let end = now_unix();
        let split = end - period_days * SECONDS_PER_DAY;
        let current_range = DateRange::new(split, end)?;
        let previous_range = DateRange::new(split - period_days * SECONDS_PER_DAY, split)?;

        let current = self.health_in_range(user_id, current_range, period_days, false, config)?;
        let previous = self.health_in_range(user_id, previous_range, period_days, false, config)?;
        Ok(compare_periods(&current, &previous))
    }

    fn health_in_range(
        &self,
        user_id: &str,
        range: DateRange,
        period_days: i64,
        include_recommendations: bool,
        config: &ScoringConfig,
    ) -> Result<HealthScore, AnalyticsError> {
        let institutions = self.store.institutions(user_id)?;
        let goals = self.store.goals(user_id)?;
        let transactions = self.store.transactions(user_id, Some(&range))?;
        let score = health_analyze(
            &transactions,
            &institutions,
            &goals,
            period_days,
            include_recommendations,
            config,
        )?;
        debug!(user_id, overall = score.overall_score, "health score computed");
        Ok(score)
    }

    // ── Reports ───────────────────────────────

    /// Cash-flow report over an explicit window.
    pub fn cash_flow_report(
        &self,
        user_id: &str,
        period: DateRange,
        options: &CashFlowOptions,
    ) -> Result<CashFlowReport, AnalyticsError> {
        let institutions = self.store.institutions(user_id)?;
        let transactions = self.store.transactions(user_id, Some(&period))?;
        analyze_cash_flow(&transactions, &institutions, period, options)
    }

    /// Flat-average projection from the trailing six months of history.
    pub fn cash_flow_projection(
        &self,
        user_id: &str,
        months_ahead: u32,
    ) -> Result<CashFlowProjection, AnalyticsError> {
        let end = now_unix();
        let range = DateRange::new(
            end - i64::from(PROJECTION_HISTORY_MONTHS) * SECONDS_PER_MONTH,
            end,
        )?;
        let institutions = self.store.institutions(user_id)?;
        let transactions = self.store.transactions(user_id, Some(&range))?;
        project_cash_flow(
            &transactions,
            &institutions,
            PROJECTION_HISTORY_MONTHS,
            months_ahead,
        )
    }

    /// Category breakdown over an explicit window.
    pub fn category_report(
        &self,
        user_id: &str,
        period: DateRange,
        options: &CategoryOptions,
    ) -> Result<CategoryReport, AnalyticsError> {
        let transactions = self.store.transactions(user_id, Some(&period))?;
        analyze_categories(&transactions, options)
    }

    /// Per-category deltas between two windows.
    pub fn category_comparison(
        &self,
        user_id: &str,
        period1: DateRange,
        period2: DateRange,
        kind_filter: Option<TransactionKind>,
    ) -> Result<CategoryComparison, AnalyticsError> {
        let before = self.store.transactions(user_id, Some(&period1))?;
        let after = self.store.transactions(user_id, Some(&period2))?;
        Ok(compare_category_periods(&before, &after, kind_filter))
    }

    /// Goal analysis over every goal the user has created.
    pub fn goal_report(&self, user_id: &str) -> Result<GoalReport, AnalyticsError> {
        let goals = self.store.goals(user_id)?;
        let institutions = self.store.institutions(user_id)?;
        analyze_goals(&goals, &institutions, now_unix())
    }

    /// Two of the user's goals side by side.
    pub fn goal_comparison(
        &self,
        user_id: &str,
        first_id: &str,
        second_id: &str,
    ) -> Result<GoalComparison, AnalyticsError> {
        let goals = self.store.goals(user_id)?;
        let institutions = self.store.institutions(user_id)?;
        compare_goals(&goals, &institutions, first_id, second_id, now_unix())
    }

    /// Balance-proportional allocation plan for one goal.
    pub fn reallocation_plan(
        &self,
        user_id: &str,
        goal_id: &str,
    ) -> Result<ReallocationPlan, AnalyticsError> {
        let goals = self.store.goals(user_id)?;
        let institutions = self.store.institutions(user_id)?;
        reallocation_strategy(&goals, &institutions, goal_id)
    }

    /// Institution analysis; the window restricts the activity metrics
    /// only.
    pub fn institution_report(
        &self,
        user_id: &str,
        period: Option<DateRange>,
    ) -> Result<InstitutionReport, AnalyticsError> {
        let institutions = self.store.institutions(user_id)?;
        let goals = self.store.goals(user_id)?;
        let transactions = self.store.transactions(user_id, period.as_ref())?;
        analyze_institutions(&institutions, &transactions, &goals)
    }

    /// Two of the user's institutions side by side, over the whole
    /// transaction history.
    pub fn institution_comparison(
        &self,
        user_id: &str,
        first_id: &str,
        second_id: &str,
    ) -> Result<InstitutionComparison, AnalyticsError> {
        let institutions = self.store.institutions(user_id)?;
        let goals = self.store.goals(user_id)?;
        let transactions = self.store.transactions(user_id, None)?;
        compare_institutions(&institutions, &transactions, &goals, first_id, second_id)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
