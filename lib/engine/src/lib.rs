/**
 * 中国象棋规则引擎入口
 *
 * 说明
 * - board: 棋盘、坐标、棋子
 * - rules: 各棋种的基础走法（几何与挡子）
 * - check: 将军检测，复用基础走法
 * - game: 对局流程，唯一修改棋盘的地方
 * - engine: 一行一条命令的文本协议
 */
pub mod board;
pub mod check;
pub mod config;
pub mod constant;
pub mod engine;
pub mod game;
pub mod rules;
