//! Rendering of [`Condition`] trees.

use crate::condition::{AndOr, Condition, Operand, WhereOpt};
use crate::error::{OrmError, OrmResult};
use crate::qb::param::ParamList;

/// Render `conditions` joined by their connectors. The first connector is dropped.
pub(crate) fn render_conditions(
    conditions: &[Condition],
    params: &mut ParamList,
    out: &mut String,
) -> OrmResult<()> {
    for (i, condition) in conditions.iter().enumerate() {
        if i > 0 {
            out.push_str(match condition.and_or {
                AndOr::And => " AND ",
                AndOr::Or => " OR ",
            });
        }
        if condition.is_group() {
            out.push('(');
            render_conditions(&condition.group, params, out)?;
            out.push(')');
        } else {
            render_condition(condition, params, out)?;
        }
    }
    Ok(())
}

fn render_condition(
    condition: &Condition,
    params: &mut ParamList,
    out: &mut String,
) -> OrmResult<()> {
    let field = condition.field.as_str();
    let opt = condition
        .opt
        .ok_or_else(|| OrmError::validation(format!("condition on `{field}` has no operator")))?;

    match (opt, &condition.value) {
        (WhereOpt::Null | WhereOpt::NotNull, _) => {
            out.push_str(&format!("{field} {}", opt.as_sql()));
        }
        (WhereOpt::In | WhereOpt::NotIn, Operand::List(values)) => {
            if values.is_empty() {
                // Nothing is in an empty list; everything is outside it.
                out.push_str(if opt == WhereOpt::In { "1=0" } else { "1=1" });
            } else {
                let placeholders: Vec<String> =
                    values.iter().map(|v| params.push(v.clone())).collect();
                out.push_str(&format!(
                    "{field} {} ({})",
                    opt.as_sql(),
                    placeholders.join(", ")
                ));
            }
        }
        (WhereOpt::In | WhereOpt::NotIn, Operand::Value(value)) => {
            let p = params.push(value.clone());
            out.push_str(&format!("{field} {} ({p})", opt.as_sql()));
        }
        (WhereOpt::Between | WhereOpt::NotBetween, Operand::Range(low, high)) => {
            let low = params.push(low.clone());
            let high = params.push(high.clone());
            out.push_str(&format!("{field} {} {low} AND {high}", opt.as_sql()));
        }
        (WhereOpt::Between | WhereOpt::NotBetween, _) => {
            return Err(OrmError::validation(format!(
                "{} on `{field}` needs a (low, high) range",
                opt.as_sql()
            )));
        }
        (_, Operand::Field(column)) => {
            out.push_str(&format!("{field} {} {}", opt.as_sql(), column.0));
        }
        (_, Operand::Value(value)) => {
            let p = params.push(value.clone());
            out.push_str(&format!("{field} {} {p}", opt.as_sql()));
        }
        (_, Operand::None | Operand::List(_) | Operand::Range(..)) => {
            return Err(OrmError::validation(format!(
                "operator {} on `{field}` needs a single value",
                opt.as_sql()
            )));
        }
    }
    Ok(())
}
