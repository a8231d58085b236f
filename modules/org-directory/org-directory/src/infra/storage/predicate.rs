//! Translation of organization predicates into `SeaORM` conditions.

use sea_orm::sea_query::{Expr, Func, LikeExpr, Query, SelectStatement, SimpleExpr};
use sea_orm::{ColumnTrait, Condition, DbBackend};

use super::entity::{organization, organization_operation_type as link};
use crate::domain::filter::OrganizationPredicate;

/// Upper bound for identifiers bound into a single `IN (...)` list.
pub const ID_BATCH: usize = 500;

const LIKE_ESCAPE: char = '\\';

/// Predicates split by where the repository evaluates them.
///
/// `in_sql` becomes the `WHERE` clause. `on_rows` is applied to the fetched
/// organization rows: title matching on `SQLite`, whose `LOWER` folds ASCII
/// only, and id sets too large for one bound-parameter list.
#[derive(Debug, Default)]
pub struct PredicatePlan<'a> {
    pub in_sql: Vec<&'a OrganizationPredicate>,
    pub on_rows: Vec<&'a OrganizationPredicate>,
}

impl<'a> PredicatePlan<'a> {
    #[must_use]
    pub fn new(predicates: &'a [OrganizationPredicate], backend: DbBackend) -> Self {
        let (in_sql, on_rows): (Vec<_>, Vec<_>) = predicates
            .iter()
            .partition(|p| runs_in_sql(p, backend));
        Self { in_sql, on_rows }
    }

    #[must_use]
    pub fn condition(&self) -> Condition {
        organization_condition(self.in_sql.iter().copied())
    }
}

fn runs_in_sql(predicate: &OrganizationPredicate, backend: DbBackend) -> bool {
    match predicate {
        OrganizationPredicate::InBuilding(_) | OrganizationPredicate::LinkedTo(_) => true,
        OrganizationPredicate::InAnyBuilding(ids) | OrganizationPredicate::LinkedToAny(ids) => {
            ids.len() <= ID_BATCH
        }
        OrganizationPredicate::TitleContains(_) => backend != DbBackend::Sqlite,
    }
}

/// Conjunction of all predicates. No predicates yields an always-true condition.
#[must_use]
pub fn organization_condition<'a>(
    predicates: impl IntoIterator<Item = &'a OrganizationPredicate>,
) -> Condition {
    predicates
        .into_iter()
        .fold(Condition::all(), |cond, p| cond.add(predicate_expr(p)))
}

fn predicate_expr(predicate: &OrganizationPredicate) -> SimpleExpr {
    match predicate {
        OrganizationPredicate::InBuilding(id) => organization::Column::BuildingId.eq(*id),
        OrganizationPredicate::InAnyBuilding(ids) => {
            organization::Column::BuildingId.is_in(ids.iter().copied())
        }
        OrganizationPredicate::LinkedTo(id) => organization::Column::Id
            .in_subquery(linked_organizations(link::Column::OperationTypeId.eq(*id))),
        OrganizationPredicate::LinkedToAny(ids) => organization::Column::Id.in_subquery(
            linked_organizations(link::Column::OperationTypeId.is_in(ids.iter().copied())),
        ),
        OrganizationPredicate::TitleContains(needle) => {
            let pattern = format!("%{}%", escape_like(needle));
            Expr::expr(Func::lower(Expr::col((
                organization::Entity,
                organization::Column::Title,
            ))))
            .like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
        }
    }
}

fn linked_organizations(type_filter: SimpleExpr) -> SelectStatement {
    Query::select()
        .column(link::Column::OrganizationId)
        .from(link::Entity)
        .and_where(type_filter)
        .to_owned()
}

/// Escapes LIKE wildcards so the needle matches literally.
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use sea_orm::{DbBackend, EntityTrait, QueryFilter, QueryTrait};

    use super::*;

    fn sql(predicates: &[OrganizationPredicate]) -> String {
        organization::Entity::find()
            .filter(organization_condition(predicates))
            .build(DbBackend::Sqlite)
            .to_string()
    }

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(escape_like("river"), "river");
    }

    #[test]
    fn empty_predicates_add_no_where_clause() {
        assert!(!sql(&[]).contains("WHERE"));
    }

    #[test]
    fn predicates_are_joined_with_and() {
        let statement = sql(&[
            OrganizationPredicate::InBuilding(3),
            OrganizationPredicate::title_contains("River"),
        ]);

        assert!(statement.contains("\"building_id\" = 3"), "{statement}");
        assert!(statement.contains(" AND "), "{statement}");
        assert!(statement.contains("LOWER("), "{statement}");
        assert!(statement.contains("'%river%'"), "{statement}");
    }

    #[test]
    fn category_links_use_join_table_subquery() {
        let statement = sql(&[OrganizationPredicate::LinkedToAny(BTreeSet::from([1, 2]))]);

        assert!(
            statement.contains("\"organization_to_operation_type\""),
            "{statement}"
        );
        assert!(statement.contains("IN (1, 2)"), "{statement}");
    }

    #[test]
    fn sqlite_matches_titles_on_rows() {
        let predicates = [
            OrganizationPredicate::InBuilding(3),
            OrganizationPredicate::title_contains("\u{0431}\u{0430}\u{043d}\u{043a}"),
        ];

        let sqlite = PredicatePlan::new(&predicates, DbBackend::Sqlite);
        assert_eq!(sqlite.in_sql, [&predicates[0]]);
        assert_eq!(sqlite.on_rows, [&predicates[1]]);

        let postgres = PredicatePlan::new(&predicates, DbBackend::Postgres);
        assert_eq!(postgres.in_sql.len(), 2);
        assert!(postgres.on_rows.is_empty());
    }

    #[test]
    fn oversized_id_sets_stay_out_of_the_statement() {
        let many: BTreeSet<i64> = (1..=2_000).collect();
        let predicates = [
            OrganizationPredicate::InAnyBuilding(many.clone()),
            OrganizationPredicate::LinkedToAny(many),
            OrganizationPredicate::LinkedToAny(BTreeSet::from([7])),
        ];

        let plan = PredicatePlan::new(&predicates, DbBackend::Postgres);

        assert_eq!(plan.on_rows, [&predicates[0], &predicates[1]]);
        let statement = organization::Entity::find()
            .filter(plan.condition())
            .build(DbBackend::Postgres)
            .to_string();
        assert!(statement.contains("IN (7)"), "{statement}");
        assert!(!statement.contains("2000"), "{statement}");
    }
}
