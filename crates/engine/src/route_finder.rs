//! Multi-hop route discovery over constant-product pools.

use crate::error::{EngineError, EngineResult};
use hybrid_dex_domain::entities::{Pool, PoolId, PoolSide};
use hybrid_dex_domain::math::{calculate_price_impact_bps, calculate_spot_out_amount};
use hybrid_dex_domain::token::TokenAmount;
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// One pool traversal inside a route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteHop {
    pub pool_id: PoolId,
    pub token_in: String,
    pub token_out: String,
    pub amount_in: TokenAmount,
    pub amount_out: TokenAmount,
    pub fee: TokenAmount,
    pub price_impact_bps: u32,
}

/// A priced path from the input token to the output token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapRoute {
    pub hops: Vec<RouteHop>,
    pub amount_in: TokenAmount,
    pub amount_out: TokenAmount,
}

impl SwapRoute {
    #[must_use]
    pub fn pool_ids(&self) -> Vec<PoolId> {
        self.hops.iter().map(|h| h.pool_id.clone()).collect()
    }

    #[must_use]
    pub fn hop_count(&self) -> usize {
        self.hops.len()
    }

    /// Whether some pool is crossed more than once.
    #[must_use]
    pub fn revisits_pool(&self) -> bool {
        let mut seen = BTreeSet::new();
        self.hops.iter().any(|h| !seen.insert(&h.pool_id))
    }

    /// Fee charged at each hop, in that hop's input token.
    #[must_use]
    pub fn fees(&self) -> Vec<TokenAmount> {
        self.hops.iter().map(|h| h.fee).collect()
    }
}

/// Ranked routes, best output first.
#[derive(Debug)]
pub struct Routes(std::vec::IntoIter<SwapRoute>);

impl Iterator for Routes {
    type Item = SwapRoute;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

/// Breadth-first search over pools with liquidity.
///
/// Paths are at most `max_hops` long, end as soon as they reach `token_out`,
/// and never go straight back through the pair they just crossed. Hops with a
/// zero output are pruned. Routes are ordered by output descending, then by
/// fewer hops; ties keep discovery order, which follows pool ids.
///
/// A path may cross the same pool twice as long as it does not do so on
/// consecutive hops; such paths are re-priced hop by hop on the reserves the
/// earlier hops leave behind.
///
/// An empty iterator means no liquidity connects the tokens; that is not an
/// error.
///
/// # Errors
/// [`EngineError::Validation`] for identical tokens; arithmetic errors.
pub fn find_routes(
    pools: &[Pool],
    token_in: &str,
    token_out: &str,
    amount_in: TokenAmount,
    max_hops: usize,
) -> EngineResult<Routes> {
    if token_in == token_out {
        return Err(EngineError::Validation(
            "input and output tokens must differ".to_string(),
        ));
    }
    if amount_in.is_zero() || max_hops == 0 {
        return Ok(Routes(Vec::new().into_iter()));
    }

    let mut by_token: BTreeMap<&str, Vec<&Pool>> = BTreeMap::new();
    let mut live: Vec<&Pool> = pools.iter().filter(|p| p.has_liquidity()).collect();
    live.sort_by(|a, b| a.id.cmp(&b.id));
    for pool in live {
        by_token.entry(pool.token_a.as_str()).or_default().push(pool);
        by_token.entry(pool.token_b.as_str()).or_default().push(pool);
    }

    let mut found = Vec::new();
    let mut queue: VecDeque<(String, Vec<RouteHop>, TokenAmount)> = VecDeque::new();
    queue.push_back((token_in.to_string(), Vec::new(), amount_in));

    while let Some((token, hops, amount)) = queue.pop_front() {
        let Some(candidates) = by_token.get(token.as_str()) else {
            continue;
        };
        for pool in candidates {
            let Some(next) = pool.other_token(&token) else {
                continue;
            };
            if hops
                .last()
                .is_some_and(|last| last.token_in == next && last.token_out == token)
            {
                continue;
            }
            let hop = price_hop(pool, &token, amount)?;
            if hop.amount_out.is_zero() {
                continue;
            }
            let out = hop.amount_out;
            let mut path = hops.clone();
            path.push(hop);
            if next == token_out {
                found.push(SwapRoute {
                    hops: path,
                    amount_in,
                    amount_out: out,
                });
            } else if path.len() < max_hops {
                queue.push_back((next.to_string(), path, out));
            }
        }
    }

    let mut found = found
        .into_iter()
        .map(|route| {
            if route.revisits_pool() {
                quote_path(pools, &route.pool_ids(), token_in, amount_in)
            } else {
                Ok(route)
            }
        })
        .collect::<EngineResult<Vec<_>>>()?;
    found.retain(|route| route.hops.iter().all(|h| !h.amount_out.is_zero()));
    found.sort_by(|a, b| {
        b.amount_out
            .cmp(&a.amount_out)
            .then(a.hops.len().cmp(&b.hops.len()))
    });
    debug!(
        token_in,
        token_out,
        amount_in = %amount_in,
        routes = found.len(),
        "Routes found"
    );
    Ok(Routes(found.into_iter()))
}

/// Re-prices a known path for a different input amount.
///
/// Each hop is priced on a working copy of its pool that already reflects
/// the earlier hops, so a pool crossed twice sees its own first trade.
///
/// # Errors
/// [`EngineError::NotFound`] for an unknown pool,
/// [`EngineError::Validation`] if the path does not chain from `token_in`.
pub fn quote_path(
    pools: &[Pool],
    path: &[PoolId],
    token_in: &str,
    amount_in: TokenAmount,
) -> EngineResult<SwapRoute> {
    let mut token = token_in.to_string();
    let mut amount = amount_in;
    let mut hops = Vec::with_capacity(path.len());
    let mut working: BTreeMap<&PoolId, Pool> = BTreeMap::new();
    for id in path {
        let pool = match working.entry(id) {
            Entry::Occupied(slot) => slot.into_mut(),
            Entry::Vacant(slot) => {
                let pool = pools
                    .iter()
                    .find(|p| &p.id == id)
                    .ok_or_else(|| EngineError::NotFound(format!("pool {id}")))?;
                slot.insert(pool.clone())
            }
        };
        let next = pool
            .other_token(&token)
            .ok_or_else(|| EngineError::Validation(format!("{token} is not traded in pool {id}")))?
            .to_string();
        let hop = price_hop(pool, &token, amount)?;
        apply_hop(pool, &hop)?;
        amount = hop.amount_out;
        hops.push(hop);
        token = next;
    }
    Ok(SwapRoute {
        hops,
        amount_in,
        amount_out: amount,
    })
}

/// Output of `amount_in` along `path` at spot prices net of fees, the
/// zero-impact reference for slippage checks.
///
/// # Errors
/// Same as [`quote_path`].
pub fn spot_output(
    pools: &[Pool],
    path: &[PoolId],
    token_in: &str,
    amount_in: TokenAmount,
) -> EngineResult<TokenAmount> {
    let mut token = token_in.to_string();
    let mut amount = amount_in;
    for id in path {
        let pool = pools
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| EngineError::NotFound(format!("pool {id}")))?;
        let (reserve_in, reserve_out) = pool
            .reserves_for(&token)
            .ok_or_else(|| EngineError::Validation(format!("{token} is not traded in pool {id}")))?;
        amount = calculate_spot_out_amount(amount, reserve_in, reserve_out, pool.fee_bps)?;
        token = pool.other_token(&token).unwrap_or_default().to_string();
    }
    Ok(amount)
}

/// Moves a priced hop through `pool`'s reserves and returns the input side.
/// Fee accounting is left to the caller.
pub(crate) fn apply_hop(pool: &mut Pool, hop: &RouteHop) -> EngineResult<PoolSide> {
    let side_in = pool
        .side_of(&hop.token_in)
        .ok_or_else(|| EngineError::Validation(format!("{} is not in {}", hop.token_in, pool.id)))?;
    match side_in {
        PoolSide::A => {
            pool.reserve_a = pool.reserve_a.checked_add(hop.amount_in)?;
            pool.reserve_b = pool.reserve_b.checked_sub(hop.amount_out)?;
        }
        PoolSide::B => {
            pool.reserve_b = pool.reserve_b.checked_add(hop.amount_in)?;
            pool.reserve_a = pool.reserve_a.checked_sub(hop.amount_out)?;
        }
    }
    Ok(side_in)
}

pub(crate) fn price_hop(pool: &Pool, token_in: &str, amount_in: TokenAmount) -> EngineResult<RouteHop> {
    let quote = pool.quote(token_in, amount_in)?;
    let (reserve_in, _) = pool.reserves_for(token_in).unwrap_or_default();
    let token_out = pool.other_token(token_in).unwrap_or_default().to_string();
    Ok(RouteHop {
        pool_id: pool.id.clone(),
        token_in: token_in.to_string(),
        token_out,
        amount_in,
        amount_out: quote.amount_out,
        fee: quote.fee,
        price_impact_bps: calculate_price_impact_bps(amount_in, reserve_in)?,
    })
}
